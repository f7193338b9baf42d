//! Hierarchical input handling
//!
//! Input is dispatched to the deepest focused element first. If that element
//! returns `InputResult::Ignored` the event bubbles up to its parent.
//!
//! ```ignore
//! impl InputHandler for MyField {
//!     fn handle_key_event(&mut self, event: &KeyEvent, ctx: &mut InputContext) -> InputResult {
//!         match event.code {
//!             KeyCode::Left => { self.move_left(); InputResult::Consumed }
//!             _ => InputResult::Ignored,
//!         }
//!     }
//! }
//! ```

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Result of handling an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputResult {
    /// The input was handled - stop propagation.
    Consumed,
    /// The input was not handled - try parent.
    Ignored,
}

/// Context passed to input handlers
#[derive(Debug, Default)]
pub struct InputContext {
    /// Status message to display (set by handlers).
    pub status_message: Option<String>,
}

impl InputContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
    }
}

/// Trait for elements that can handle input events.
pub trait InputHandler {
    /// Handle a key event. Returns whether the event was consumed.
    fn handle_key_event(&mut self, event: &KeyEvent, ctx: &mut InputContext) -> InputResult;

    /// Get the currently focused child handler mutably, if any.
    fn focused_child_mut(&mut self) -> Option<&mut dyn InputHandler> {
        None
    }

    /// Dispatch input through this handler and its focused child.
    fn dispatch_input(&mut self, event: &KeyEvent, ctx: &mut InputContext) -> InputResult {
        if let Some(child) = self.focused_child_mut() {
            if child.dispatch_input(event, ctx) == InputResult::Consumed {
                return InputResult::Consumed;
            }
        }
        self.handle_key_event(event, ctx)
    }
}

/// Ctrl plus a character, with no other modifier
pub fn is_key_with_ctrl(event: &KeyEvent, c: char) -> bool {
    event.code == KeyCode::Char(c) && event.modifiers == KeyModifiers::CONTROL
}

/// Printable character typed without Ctrl or Alt
pub fn typed_char(event: &KeyEvent) -> Option<char> {
    match event.code {
        KeyCode::Char(c)
            if !event
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(c)
        }
        _ => None,
    }
}
