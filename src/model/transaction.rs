//! Transactional edits
//!
//! A [`Transaction`] is an ordered batch of [`Step`]s plus an optional new
//! selection and a stored-marks update. It is applied atomically by
//! [`EditorState::apply`](crate::state::EditorState::apply): either every
//! step succeeds and the state moves to the next document revision, or the
//! state is left untouched.

use super::document::{Block, Document, Mark, TextRun};
use std::fmt;

/// Error produced when a step does not fit the document it is applied to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// Range is inverted, out of bounds, or crosses a block boundary
    InvalidRange { from: usize, to: usize },
    /// Position does not lie inside paragraph content
    NotInTextBlock { pos: usize },
    /// Block index does not exist or has the wrong kind
    InvalidBlock { index: usize },
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::InvalidRange { from, to } => write!(f, "invalid range {from}..{to}"),
            EditError::NotInTextBlock { pos } => {
                write!(f, "position {pos} is not inside a text block")
            }
            EditError::InvalidBlock { index } => write!(f, "invalid block index {index}"),
        }
    }
}

impl std::error::Error for EditError {}

/// Cursor or range, resolved against one document revision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    /// Collapsed selection
    pub fn cursor(pos: usize) -> Self {
        Self {
            anchor: pos,
            head: pos,
        }
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }
}

/// A single document change
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Replace `[from, to)` inside one paragraph with inline runs
    ReplaceText {
        from: usize,
        to: usize,
        runs: Vec<TextRun>,
    },
    /// Replace a whole block
    ReplaceBlock { block_index: usize, block: Block },
    /// Split the paragraph containing `pos`
    SplitBlock { pos: usize },
    /// Merge the paragraph at `block_index` into the paragraph before it
    JoinBackward { block_index: usize },
    /// Remove a block
    RemoveBlock { block_index: usize },
}

impl Step {
    /// Apply this step, producing the next revision
    pub fn apply(&self, doc: &Document) -> Result<Document, EditError> {
        let mut blocks = doc.blocks().to_vec();
        match self {
            Step::ReplaceText { from, to, runs } => {
                let invalid = EditError::InvalidRange {
                    from: *from,
                    to: *to,
                };
                if from > to {
                    return Err(invalid);
                }
                let start = doc.resolve(*from).ok_or(invalid.clone())?;
                let end = doc.resolve(*to).ok_or(invalid.clone())?;
                if start.block_index != end.block_index {
                    return Err(invalid);
                }
                let replaced = blocks[start.block_index]
                    .replace_range(start.offset..end.offset, runs.clone())
                    .ok_or(invalid)?;
                blocks[start.block_index] = replaced;
            }
            Step::ReplaceBlock { block_index, block } => {
                let slot = blocks.get_mut(*block_index).ok_or(EditError::InvalidBlock {
                    index: *block_index,
                })?;
                *slot = block.clone();
            }
            Step::SplitBlock { pos } => {
                let resolved = doc
                    .resolve(*pos)
                    .ok_or(EditError::NotInTextBlock { pos: *pos })?;
                let (left, right) = blocks[resolved.block_index]
                    .split_at(resolved.offset)
                    .ok_or(EditError::NotInTextBlock { pos: *pos })?;
                blocks[resolved.block_index] = left;
                blocks.insert(resolved.block_index + 1, right);
            }
            Step::JoinBackward { block_index } => {
                let invalid = EditError::InvalidBlock {
                    index: *block_index,
                };
                if *block_index == 0 || *block_index >= blocks.len() {
                    return Err(invalid);
                }
                let joined = blocks[block_index - 1]
                    .joined_with(&blocks[*block_index])
                    .ok_or(invalid)?;
                blocks[block_index - 1] = joined;
                blocks.remove(*block_index);
            }
            Step::RemoveBlock { block_index } => {
                if *block_index >= blocks.len() {
                    return Err(EditError::InvalidBlock {
                        index: *block_index,
                    });
                }
                blocks.remove(*block_index);
            }
        }
        Ok(doc.with_blocks(blocks))
    }

    /// Map a position from the document before this step to the document
    /// after it
    pub fn map(&self, before: &Document, pos: usize) -> usize {
        match self {
            Step::ReplaceText { from, to, runs } => {
                let inserted: usize = runs.iter().map(TextRun::char_len).sum();
                if pos < *from {
                    pos
                } else if pos > *to {
                    pos - (to - from) + inserted
                } else {
                    from + inserted
                }
            }
            Step::ReplaceBlock { block_index, block } => {
                let start = before.block_start(*block_index);
                let old_size = before.block(*block_index).map_or(0, Block::node_size);
                let new_size = block.node_size();
                if pos <= start {
                    pos
                } else if pos >= start + old_size {
                    pos - old_size + new_size
                } else {
                    pos.min(start + new_size.saturating_sub(1))
                }
            }
            Step::SplitBlock { pos: at } => {
                if pos >= *at {
                    pos + 2
                } else {
                    pos
                }
            }
            Step::JoinBackward { block_index } => {
                let boundary = before.block_start(*block_index);
                if pos < boundary {
                    pos
                } else if pos == boundary {
                    boundary.saturating_sub(1)
                } else {
                    pos - 2
                }
            }
            Step::RemoveBlock { block_index } => {
                let start = before.block_start(*block_index);
                let size = before.block(*block_index).map_or(0, Block::node_size);
                if pos < start {
                    pos
                } else if pos >= start + size {
                    pos - size
                } else {
                    start
                }
            }
        }
    }
}

/// How a transaction updates the stored marks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StoredMarksUpdate {
    /// Forget stored marks (the default for any edit)
    #[default]
    Clear,
    /// Typing continues with the marks at the new selection head, minus one
    Remove(Mark),
}

/// An atomic batch of steps
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    steps: Vec<Step>,
    selection: Option<Selection>,
    stored_marks: StoredMarksUpdate,
    description: String,
}

impl Transaction {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn replace_text(self, from: usize, to: usize, runs: Vec<TextRun>) -> Self {
        self.step(Step::ReplaceText { from, to, runs })
    }

    pub fn replace_block(self, block_index: usize, block: Block) -> Self {
        self.step(Step::ReplaceBlock { block_index, block })
    }

    /// Explicit selection after all steps; otherwise the current selection is
    /// mapped through them
    pub fn set_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn remove_stored_mark(mut self, mark: Mark) -> Self {
        self.stored_marks = StoredMarksUpdate::Remove(mark);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn stored_marks(&self) -> &StoredMarksUpdate {
        &self.stored_marks
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
