//! Core document model
//!
//! Pure data structures with no I/O.

pub mod document;
pub mod transaction;
