//! View layer
//!
//! Display-only derivations of the document.

pub mod annotator;
