use crate::model::document::{Document, Mark, ResolvedPos, TextRun};
use crate::model::transaction::{EditError, Selection, Step, StoredMarksUpdate, Transaction};

/// The editing state of the document body: current revision, selection and
/// stored marks
#[derive(Debug, Clone)]
pub struct EditorState {
    doc: Document,
    selection: Selection,
    /// Marks applied to the next typed text, overriding the marks at the cursor
    stored_marks: Option<Vec<Mark>>,
}

impl EditorState {
    /// Create a state with the cursor at the start of the first paragraph
    pub fn new(doc: Document) -> Self {
        let start = doc.near_text_position(0);
        Self {
            doc,
            selection: Selection::cursor(start),
            stored_marks: None,
        }
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn stored_marks(&self) -> Option<&[Mark]> {
        self.stored_marks.as_deref()
    }

    /// Selection head resolved against the current revision
    pub fn resolved_head(&self) -> Option<ResolvedPos> {
        self.doc.resolve(self.selection.head)
    }

    /// Marks at a content position
    pub fn marks_at(&self, pos: usize) -> Vec<Mark> {
        self.doc
            .resolve(pos)
            .and_then(|r| self.doc.block(r.block_index).map(|b| b.marks_at(r.offset)))
            .unwrap_or_default()
    }

    /// Apply a transaction atomically
    pub fn apply(&mut self, tr: Transaction) -> Result<(), EditError> {
        let mut doc = self.doc.clone();
        let mut anchor = self.selection.anchor;
        let mut head = self.selection.head;
        for step in tr.steps() {
            let next = step.apply(&doc)?;
            anchor = step.map(&doc, anchor);
            head = step.map(&doc, head);
            doc = next;
        }

        let selection = tr.selection().unwrap_or(Selection { anchor, head });
        let selection = Selection {
            anchor: doc.near_text_position(selection.anchor),
            head: doc.near_text_position(selection.head),
        };

        tracing::trace!(
            "apply '{}': {} step(s), revision {} -> {}",
            tr.description(),
            tr.steps().len(),
            self.doc.revision(),
            doc.revision()
        );

        self.doc = doc;
        self.selection = selection;
        self.stored_marks = match tr.stored_marks() {
            StoredMarksUpdate::Clear => None,
            StoredMarksUpdate::Remove(mark) => {
                let mut marks = self.marks_at(selection.head);
                marks.retain(|m| m != mark);
                Some(marks)
            }
        };
        Ok(())
    }

    /// Move the cursor, snapping to the nearest text position
    pub fn set_cursor(&mut self, pos: usize) {
        self.selection = Selection::cursor(self.doc.near_text_position(pos));
        self.stored_marks = None;
    }

    /// Replace the selection with typed text
    pub fn insert_text(&mut self, text: &str) -> Result<(), EditError> {
        let from = self.selection.from();
        let to = self.selection.to();
        let marks = match &self.stored_marks {
            Some(marks) => marks.clone(),
            None => self.marks_at(from),
        };
        let len = text.chars().count();
        let tr = Transaction::new("insert text")
            .replace_text(from, to, vec![TextRun::with_marks(text, &marks)])
            .set_selection(Selection::cursor(from + len));
        self.apply(tr)
    }

    /// Default Enter behaviour: split the paragraph at the cursor
    pub fn split_block(&mut self) -> Result<(), EditError> {
        let pos = self.selection.head;
        self.apply(Transaction::new("split block").step(Step::SplitBlock { pos }))
    }

    /// Backspace: delete the character before the cursor, or join with the
    /// previous block at a paragraph start
    pub fn delete_backward(&mut self) -> Result<(), EditError> {
        if !self.selection.is_empty() {
            return self.delete_selection();
        }
        let Some(here) = self.resolved_head() else {
            return Ok(());
        };
        let head = self.selection.head;
        if here.offset > 0 {
            let tr = Transaction::new("delete backward")
                .replace_text(head - 1, head, Vec::new())
                .set_selection(Selection::cursor(head - 1));
            return self.apply(tr);
        }
        if here.block_index == 0 {
            return Ok(());
        }
        let previous = here.block_index - 1;
        let step = match self.doc.block(previous) {
            Some(block) if block.is_textblock() => Step::JoinBackward {
                block_index: here.block_index,
            },
            Some(_) => Step::RemoveBlock {
                block_index: previous,
            },
            None => return Ok(()),
        };
        self.apply(Transaction::new("delete backward").step(step))
    }

    /// Delete: remove the character after the cursor, or pull the next block
    /// into this paragraph at a paragraph end
    pub fn delete_forward(&mut self) -> Result<(), EditError> {
        if !self.selection.is_empty() {
            return self.delete_selection();
        }
        let Some(here) = self.resolved_head() else {
            return Ok(());
        };
        let head = self.selection.head;
        let len = self
            .doc
            .block(here.block_index)
            .map_or(0, |block| block.char_len());
        if here.offset < len {
            let tr = Transaction::new("delete forward")
                .replace_text(head, head + 1, Vec::new())
                .set_selection(Selection::cursor(head));
            return self.apply(tr);
        }
        let next = here.block_index + 1;
        let step = match self.doc.block(next) {
            Some(block) if block.is_textblock() => Step::JoinBackward { block_index: next },
            Some(_) => Step::RemoveBlock { block_index: next },
            None => return Ok(()),
        };
        self.apply(
            Transaction::new("delete forward")
                .step(step)
                .set_selection(Selection::cursor(head)),
        )
    }

    fn delete_selection(&mut self) -> Result<(), EditError> {
        let from = self.selection.from();
        let to = self.selection.to();
        let tr = Transaction::new("delete selection")
            .replace_text(from, to, Vec::new())
            .set_selection(Selection::cursor(from));
        self.apply(tr)
    }

    pub fn move_left(&mut self) {
        let Some(here) = self.resolved_head() else {
            return;
        };
        if here.offset > 0 {
            self.set_cursor(self.selection.head - 1);
        } else if let Some((start, len)) = self.neighbour_paragraph(here.block_index, false) {
            self.set_cursor(start + 1 + len);
        }
    }

    pub fn move_right(&mut self) {
        let Some(here) = self.resolved_head() else {
            return;
        };
        let len = self.doc.block(here.block_index).map_or(0, |b| b.char_len());
        if here.offset < len {
            self.set_cursor(self.selection.head + 1);
        } else if let Some((start, _)) = self.neighbour_paragraph(here.block_index, true) {
            self.set_cursor(start + 1);
        }
    }

    pub fn move_up(&mut self) {
        self.move_vertically(false);
    }

    pub fn move_down(&mut self) {
        self.move_vertically(true);
    }

    pub fn move_home(&mut self) {
        if let Some(here) = self.resolved_head() {
            self.set_cursor(here.content_start());
        }
    }

    pub fn move_end(&mut self) {
        if let Some(here) = self.resolved_head() {
            let len = self.doc.block(here.block_index).map_or(0, |b| b.char_len());
            self.set_cursor(here.content_start() + len);
        }
    }

    fn move_vertically(&mut self, down: bool) {
        let Some(here) = self.resolved_head() else {
            return;
        };
        if let Some((start, len)) = self.neighbour_paragraph(here.block_index, down) {
            self.set_cursor(start + 1 + here.offset.min(len));
        }
    }

    /// Start position and length of the closest paragraph before or after
    /// `block_index`
    fn neighbour_paragraph(&self, block_index: usize, forward: bool) -> Option<(usize, usize)> {
        let candidates: Vec<_> = self
            .doc
            .positioned_blocks()
            .filter(|(index, _, block)| {
                block.is_textblock()
                    && if forward {
                        *index > block_index
                    } else {
                        *index < block_index
                    }
            })
            .map(|(_, start, block)| (start, block.char_len()))
            .collect();
        if forward {
            candidates.first().copied()
        } else {
            candidates.last().copied()
        }
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new(Document::default())
    }
}
