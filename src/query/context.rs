//! Deriving the query, its classification and its surrounding context from
//! the document and cursor

use crate::model::document::{char_slice, Document};
use crate::primitives::query_scanner::find_trigger;
use crate::services::resolution::LineContext;

/// Default number of earlier paragraphs sent as context
pub const DEFAULT_PRECEDING_LIMIT: usize = 5;

/// A query found under the cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedQuery {
    /// Trimmed text between the trigger and the cursor
    pub query: String,
    /// Text before the trigger or after the cursor on the same line
    pub templated: bool,
    pub context: Option<LineContext>,
    /// Absolute position of the trigger character
    pub trigger_pos: usize,
    /// Absolute cursor position (end of the query span)
    pub cursor_pos: usize,
    pub block_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// No trigger before the cursor, or the cursor is not in a paragraph
    NoQuery,
    /// A lone `/` at the start of an otherwise empty document
    Bare,
    Query(ExtractedQuery),
}

/// Extract the query ending at `cursor`
pub fn extract(doc: &Document, cursor: usize, preceding_limit: usize) -> Extraction {
    let Some(here) = doc.resolve(cursor) else {
        return Extraction::NoQuery;
    };
    let Some(block) = doc.block(here.block_index) else {
        return Extraction::NoQuery;
    };
    let line = block.text_content();
    let line_len = block.char_len();
    let Some(trigger) = find_trigger(char_slice(&line, 0..here.offset)) else {
        return Extraction::NoQuery;
    };

    let query = char_slice(&line, trigger + 1..here.offset).trim().to_string();
    let others_blank = doc
        .blocks()
        .iter()
        .enumerate()
        .all(|(i, b)| i == here.block_index || b.text_content().trim().is_empty());
    if query.is_empty() && trigger == 0 && others_blank {
        return Extraction::Bare;
    }

    let prefix = char_slice(&line, 0..trigger).to_string();
    let suffix = char_slice(&line, here.offset..line_len).to_string();
    let templated = !prefix.is_empty() || !suffix.is_empty();
    let context = LineContext {
        preceding: preceding_text(doc, here.block_index, preceding_limit),
        prefix,
        suffix,
    };

    Extraction::Query(ExtractedQuery {
        query,
        templated,
        context: context.non_empty(),
        trigger_pos: here.content_start() + trigger,
        cursor_pos: cursor,
        block_index: here.block_index,
    })
}

/// Newline-joined text of the last `limit` non-blank paragraphs before
/// `block_index`
fn preceding_text(doc: &Document, block_index: usize, limit: usize) -> String {
    let texts: Vec<String> = doc.blocks()[..block_index]
        .iter()
        .filter(|b| b.is_textblock())
        .map(|b| b.text_content())
        .filter(|t| !t.trim().is_empty())
        .collect();
    let skip = texts.len().saturating_sub(limit);
    texts[skip..].join("\n")
}
