//! Single-line title field

use super::handler::{typed_char, InputContext, InputHandler, InputResult};
use crate::model::document::byte_index;
use crossterm::event::{KeyCode, KeyEvent};
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Default)]
pub struct TitleField {
    text: String,
    /// Character index
    cursor: usize,
}

impl TitleField {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Display column of the cursor
    pub fn cursor_column(&self) -> usize {
        self.text[..byte_index(&self.text, self.cursor)].width()
    }

    fn insert_char(&mut self, c: char) {
        let at = byte_index(&self.text, self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    fn remove_at(&mut self, index: usize) {
        let at = byte_index(&self.text, index);
        if at < self.text.len() {
            self.text.remove(at);
        }
    }
}

impl InputHandler for TitleField {
    fn handle_key_event(&mut self, event: &KeyEvent, _ctx: &mut InputContext) -> InputResult {
        if let Some(c) = typed_char(event) {
            self.insert_char(c);
            return InputResult::Consumed;
        }
        let len = self.text.chars().count();
        match event.code {
            KeyCode::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                self.remove_at(self.cursor);
            }
            KeyCode::Delete if self.cursor < len => self.remove_at(self.cursor),
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(len),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = len,
            KeyCode::Backspace | KeyCode::Delete => {}
            _ => return InputResult::Ignored,
        }
        InputResult::Consumed
    }
}
