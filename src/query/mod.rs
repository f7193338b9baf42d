//! Inline `/query` detection and resolution

pub mod context;
pub mod orchestrator;
pub mod placeholder;

pub use context::{extract, ExtractedQuery, Extraction};
pub use orchestrator::{
    CommitKind, KeyDisposition, Orchestrator, RequestId, ResolutionState, Settlement,
    ERROR_MARKER,
};
pub use placeholder::{Locator, RESOLVING_SENTINEL};
