//! Resolution Service contract
//!
//! The service turns a [`ResolutionRequest`] into answer text. The editor
//! core only depends on the [`ResolutionService`] trait; the default
//! implementation posts JSON over HTTP (see [`http`]).

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use http::HttpResolutionService;

/// Text surrounding a query, captured once when the query is triggered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineContext {
    /// Up to N earlier non-empty paragraphs, oldest first, newline-joined
    pub preceding: String,
    /// Same-line text before the trigger
    pub prefix: String,
    /// Same-line text after the cursor
    pub suffix: String,
}

impl LineContext {
    pub fn is_empty(&self) -> bool {
        self.preceding.is_empty() && self.prefix.is_empty() && self.suffix.is_empty()
    }

    /// `Some` only when at least one field carries text
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// Body sent to the service
///
/// Serializes as `{"question": ..., "preceding": ..., "prefix": ..., "suffix": ...}`
/// with the context fields present only when there is context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionRequest {
    pub question: String,
    #[serde(flatten)]
    pub context: Option<LineContext>,
}

impl ResolutionRequest {
    pub fn new(question: impl Into<String>, context: Option<LineContext>) -> Self {
        Self {
            question: question.into(),
            context: context.and_then(LineContext::non_empty),
        }
    }

    /// A request needs a question unless some context is present
    pub fn is_resolvable(&self) -> bool {
        !self.question.is_empty() || self.context.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// Successful response body
#[derive(Debug, Clone, Deserialize)]
pub struct ResolutionResponse {
    pub answer: String,
}

/// Error response body
#[derive(Debug, Clone, Deserialize)]
pub struct ResolutionErrorBody {
    pub error: String,
}

/// Why a request could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// Neither a question nor any context
    MissingQuestion,
    /// Connection, TLS or timeout failure
    Transport(String),
    /// Non-2xx status, with the service's `error` field when it sent one
    Status { code: u16, message: Option<String> },
    /// 2xx response whose body is not `{"answer": string}`
    InvalidResponse(String),
    /// The request never ran (no runtime, task panicked)
    Unavailable(String),
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionError::MissingQuestion => write!(f, "Missing question"),
            ResolutionError::Transport(msg) => write!(f, "Request failed: {}", msg),
            ResolutionError::Status {
                code,
                message: Some(message),
            } => write!(f, "Service returned {}: {}", code, message),
            ResolutionError::Status { code, message: None } => {
                write!(f, "Service returned {}", code)
            }
            ResolutionError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            ResolutionError::Unavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ResolutionError {}

/// External collaborator answering inline queries
#[async_trait]
pub trait ResolutionService: Send + Sync {
    async fn resolve(&self, request: ResolutionRequest) -> Result<String, ResolutionError>;
}
