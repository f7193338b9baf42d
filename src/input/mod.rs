//! Keyboard input handling

pub mod handler;
pub mod title_field;
