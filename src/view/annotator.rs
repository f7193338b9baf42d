//! Display-only decorations derived from the document
//!
//! Decorations never touch the document. They are recomputed from scratch
//! whenever the document changes.

use crate::model::document::{BlockId, Document};
use crate::primitives::query_scanner::find_trigger;
use ratatui::style::{Color, Modifier, Style};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationKind {
    /// Query text that has not been resolved yet
    ActiveQuery,
    /// The document is a single empty paragraph; the hint goes here
    EmptyDocument,
}

impl DecorationKind {
    pub fn style(&self) -> Style {
        match self {
            DecorationKind::ActiveQuery => Style::default().fg(Color::Magenta),
            DecorationKind::EmptyDocument => Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        }
    }
}

/// A highlighted region of one paragraph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    pub block_index: usize,
    pub block_id: BlockId,
    /// Absolute document positions
    pub range: Range<usize>,
    pub kind: DecorationKind,
}

impl Decoration {
    /// Character offsets inside the paragraph
    pub fn offsets(&self, doc: &Document) -> Range<usize> {
        let content_start = doc.block_start(self.block_index) + 1;
        self.range.start.saturating_sub(content_start)..self.range.end.saturating_sub(content_start)
    }
}

/// Highlight every paragraph holding a trigger, from the trigger to the end
/// of the paragraph
pub fn compute_decorations(doc: &Document) -> Vec<Decoration> {
    if doc.is_empty() {
        return doc
            .positioned_blocks()
            .map(|(block_index, start, block)| Decoration {
                block_index,
                block_id: block.id,
                range: start + 1..start + 1,
                kind: DecorationKind::EmptyDocument,
            })
            .collect();
    }

    doc.positioned_blocks()
        .filter(|(_, _, block)| block.is_textblock())
        .filter_map(|(block_index, start, block)| {
            let trigger = find_trigger(&block.text_content())?;
            Some(Decoration {
                block_index,
                block_id: block.id,
                range: start + 1 + trigger..start + 1 + block.char_len(),
                kind: DecorationKind::ActiveQuery,
            })
        })
        .collect()
}
