//! Block document model
//!
//! A document is an ordered list of blocks. Paragraphs carry inline text runs,
//! rules are leaf blocks without text. A `Document` is an immutable value:
//! edits go through a [`Transaction`](super::transaction::Transaction) and
//! produce a new revision.
//!
//! Positions are absolute and count:
//! - one slot for entering and one for leaving every paragraph,
//! - one slot per character (Unicode scalar value) of paragraph content,
//! - one slot for every leaf block.
//!
//! A paragraph starting at `p` therefore has content positions
//! `p + 1 ..= p + 1 + len`.

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Stable identifier for a block, unique for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u64);

impl BlockId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        static NEXT_BLOCK_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_BLOCK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Inline formatting carried by a text run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mark {
    Bold,
    Italic,
}

/// A run of text sharing one set of marks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    /// Sorted and deduplicated
    pub marks: Vec<Mark>,
}

impl TextRun {
    /// Unformatted text
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn with_marks(text: impl Into<String>, marks: &[Mark]) -> Self {
        Self {
            text: text.into(),
            marks: normalize_marks(marks),
        }
    }

    pub fn has_mark(&self, mark: Mark) -> bool {
        self.marks.contains(&mark)
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Sort and deduplicate a mark set
pub fn normalize_marks(marks: &[Mark]) -> Vec<Mark> {
    let mut marks = marks.to_vec();
    marks.sort();
    marks.dedup();
    marks
}

/// Block content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// Text-bearing block
    Paragraph(Vec<TextRun>),
    /// Horizontal rule (leaf, no text)
    Rule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
}

impl Block {
    pub fn paragraph(runs: Vec<TextRun>) -> Self {
        Self {
            id: BlockId::next(),
            kind: BlockKind::Paragraph(merge_runs(runs)),
        }
    }

    /// Paragraph holding a single unformatted run
    pub fn text(text: impl Into<String>) -> Self {
        Self::paragraph(vec![TextRun::plain(text)])
    }

    pub fn rule() -> Self {
        Self {
            id: BlockId::next(),
            kind: BlockKind::Rule,
        }
    }

    pub fn is_textblock(&self) -> bool {
        matches!(self.kind, BlockKind::Paragraph(_))
    }

    /// Inline runs (empty for leaf blocks)
    pub fn runs(&self) -> &[TextRun] {
        match &self.kind {
            BlockKind::Paragraph(runs) => runs,
            BlockKind::Rule => &[],
        }
    }

    /// Plain text content
    pub fn text_content(&self) -> String {
        self.runs().iter().map(|r| r.text.as_str()).collect()
    }

    /// Content length in characters
    pub fn char_len(&self) -> usize {
        self.runs().iter().map(TextRun::char_len).sum()
    }

    /// Number of positions this block occupies in the document
    pub fn node_size(&self) -> usize {
        match self.kind {
            BlockKind::Paragraph(_) => self.char_len() + 2,
            BlockKind::Rule => 1,
        }
    }

    /// Marks that text typed at `offset` would inherit
    ///
    /// Text before the offset wins; at the start of the block the first
    /// character's marks are used.
    pub fn marks_at(&self, offset: usize) -> Vec<Mark> {
        let probe = if offset > 0 { offset - 1 } else { 0 };
        let mut seen = 0;
        for run in self.runs() {
            let len = run.char_len();
            if probe < seen + len {
                return run.marks.clone();
            }
            seen += len;
        }
        Vec::new()
    }

    /// Replace the character range `range` of this paragraph with `runs`,
    /// keeping the block id. Returns `None` for leaf blocks or an out of
    /// bounds range.
    pub fn replace_range(&self, range: Range<usize>, runs: Vec<TextRun>) -> Option<Block> {
        let BlockKind::Paragraph(existing) = &self.kind else {
            return None;
        };
        if range.start > range.end || range.end > self.char_len() {
            return None;
        }
        let (before, _) = split_runs(existing, range.start);
        let (_, after) = split_runs(existing, range.end);
        let mut merged = before;
        merged.extend(runs);
        merged.extend(after);
        Some(Block {
            id: self.id,
            kind: BlockKind::Paragraph(merge_runs(merged)),
        })
    }

    /// Split this paragraph at `offset`. The first half keeps the id.
    pub fn split_at(&self, offset: usize) -> Option<(Block, Block)> {
        let BlockKind::Paragraph(existing) = &self.kind else {
            return None;
        };
        if offset > self.char_len() {
            return None;
        }
        let (before, after) = split_runs(existing, offset);
        Some((
            Block {
                id: self.id,
                kind: BlockKind::Paragraph(merge_runs(before)),
            },
            Block::paragraph(after),
        ))
    }

    /// Append the content of another paragraph to this one
    pub fn joined_with(&self, other: &Block) -> Option<Block> {
        match (&self.kind, &other.kind) {
            (BlockKind::Paragraph(left), BlockKind::Paragraph(right)) => {
                let mut runs = left.clone();
                runs.extend(right.iter().cloned());
                Some(Block {
                    id: self.id,
                    kind: BlockKind::Paragraph(merge_runs(runs)),
                })
            }
            _ => None,
        }
    }
}

/// Split runs at a character offset
fn split_runs(runs: &[TextRun], at: usize) -> (Vec<TextRun>, Vec<TextRun>) {
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut seen = 0;
    for run in runs {
        let len = run.char_len();
        if seen + len <= at {
            before.push(run.clone());
        } else if seen >= at {
            after.push(run.clone());
        } else {
            let split = byte_index(&run.text, at - seen);
            before.push(TextRun {
                text: run.text[..split].to_string(),
                marks: run.marks.clone(),
            });
            after.push(TextRun {
                text: run.text[split..].to_string(),
                marks: run.marks.clone(),
            });
        }
        seen += len;
    }
    (before, after)
}

/// Drop empty runs and merge neighbours with identical marks
fn merge_runs(runs: Vec<TextRun>) -> Vec<TextRun> {
    let mut merged: Vec<TextRun> = Vec::with_capacity(runs.len());
    for run in runs {
        if run.text.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(last) if last.marks == run.marks => last.text.push_str(&run.text),
            _ => merged.push(run),
        }
    }
    merged
}

/// Byte index of the `char_index`-th character (clamped to the string end)
pub fn byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Slice a string by character range (clamped to the string end)
pub fn char_slice(s: &str, range: Range<usize>) -> &str {
    let start = byte_index(s, range.start);
    let end = byte_index(s, range.end.max(range.start));
    &s[start..end]
}

/// A position resolved to a paragraph and an offset within it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPos {
    pub block_index: usize,
    /// Position immediately before the block
    pub block_start: usize,
    /// Character offset inside the block content
    pub offset: usize,
}

impl ResolvedPos {
    /// First content position of the block
    pub fn content_start(&self) -> usize {
        self.block_start + 1
    }
}

/// One immutable revision of the document
#[derive(Debug, Clone)]
pub struct Document {
    blocks: Arc<Vec<Block>>,
    revision: u64,
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.blocks == other.blocks
    }
}

impl Eq for Document {}

impl Default for Document {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Document {
    /// Create a document. A document always holds at least one paragraph.
    pub fn new(mut blocks: Vec<Block>) -> Self {
        if !blocks.iter().any(Block::is_textblock) {
            blocks.push(Block::text(""));
        }
        Self {
            blocks: Arc::new(blocks),
            revision: 0,
        }
    }

    /// Build a document from plain text: one paragraph per line, `---` lines
    /// become rules
    pub fn from_text(text: &str) -> Self {
        let blocks = text
            .lines()
            .map(|line| {
                if line.trim() == "---" {
                    Block::rule()
                } else {
                    Block::text(line)
                }
            })
            .collect();
        Self::new(blocks)
    }

    /// Next revision with a new block list
    pub(crate) fn with_blocks(&self, blocks: Vec<Block>) -> Self {
        let mut next = Self::new(blocks);
        next.revision = self.revision + 1;
        next
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Total number of positions
    pub fn content_size(&self) -> usize {
        self.blocks.iter().map(Block::node_size).sum()
    }

    /// Position immediately before the block at `index`
    pub fn block_start(&self, index: usize) -> usize {
        self.blocks[..index.min(self.blocks.len())]
            .iter()
            .map(Block::node_size)
            .sum()
    }

    /// Iterate `(index, start position, block)`
    pub fn positioned_blocks(&self) -> impl Iterator<Item = (usize, usize, &Block)> {
        self.blocks
            .iter()
            .enumerate()
            .scan(0usize, |start, (index, block)| {
                let here = *start;
                *start += block.node_size();
                Some((index, here, block))
            })
    }

    /// Resolve a position inside paragraph content
    pub fn resolve(&self, pos: usize) -> Option<ResolvedPos> {
        for (block_index, start, block) in self.positioned_blocks() {
            if !block.is_textblock() {
                continue;
            }
            let content_start = start + 1;
            let content_end = content_start + block.char_len();
            if pos >= content_start && pos <= content_end {
                return Some(ResolvedPos {
                    block_index,
                    block_start: start,
                    offset: pos - content_start,
                });
            }
        }
        None
    }

    /// Text in `[from, to)`, with no separator between blocks.
    /// `None` when the range is inverted or beyond the document.
    pub fn text_between(&self, from: usize, to: usize) -> Option<String> {
        if from > to || to > self.content_size() {
            return None;
        }
        let mut out = String::new();
        for (_, start, block) in self.positioned_blocks() {
            if !block.is_textblock() {
                continue;
            }
            let content_start = start + 1;
            let content_end = content_start + block.char_len();
            let lo = from.max(content_start);
            let hi = to.min(content_end);
            if lo < hi {
                let text = block.text_content();
                out.push_str(char_slice(&text, lo - content_start..hi - content_start));
            }
        }
        Some(out)
    }

    /// First occurrence of `needle` inside any paragraph, in document order
    pub fn find_text(&self, needle: &str) -> Option<Range<usize>> {
        if needle.is_empty() {
            return None;
        }
        let needle_len = needle.chars().count();
        self.positioned_blocks().find_map(|(_, start, block)| {
            if !block.is_textblock() {
                return None;
            }
            let text = block.text_content();
            let byte = text.find(needle)?;
            let offset = text[..byte].chars().count();
            let from = start + 1 + offset;
            Some(from..from + needle_len)
        })
    }

    /// Concatenated text of all paragraphs
    pub fn text_content(&self) -> String {
        self.blocks.iter().map(Block::text_content).collect()
    }

    /// The nearest position that lies inside paragraph content, searching
    /// forward first and then backward. `pos` is clamped to the document.
    pub fn near_text_position(&self, pos: usize) -> usize {
        let pos = pos.min(self.content_size());
        if self.resolve(pos).is_some() {
            return pos;
        }
        let mut before = None;
        for (_, start, block) in self.positioned_blocks() {
            if !block.is_textblock() {
                continue;
            }
            let content_start = start + 1;
            let content_end = content_start + block.char_len();
            if content_start >= pos {
                return content_start;
            }
            before = Some(content_end);
        }
        before.unwrap_or(0)
    }

    /// Whether the document is a single empty paragraph
    pub fn is_empty(&self) -> bool {
        matches!(self.blocks.as_slice(), [only] if only.is_textblock() && only.char_len() == 0)
    }
}
