//! Inline query state machine
//!
//! Each query moves through
//! `Idle -> Detected -> PlaceholderInserted -> AwaitingResolution` and then
//! settles as `Committed` or `Dropped`. The orchestrator never talks to the
//! Resolution Service itself: [`Orchestrator::handle_key`] hands back the
//! request to dispatch and [`Orchestrator::settle`] takes the outcome, so the
//! whole machine can be driven synchronously.

use super::context::{extract, Extraction, DEFAULT_PRECEDING_LIMIT};
use super::placeholder::{self, Locator, RESOLVING_SENTINEL};
use crate::model::document::{Block, Mark, TextRun};
use crate::model::transaction::{Selection, Transaction};
use crate::services::resolution::{ResolutionError, ResolutionRequest};
use crate::state::EditorState;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// Text committed in place of a query whose resolution failed
pub const ERROR_MARKER: &str = "[error]";

/// Identifies one in-flight query
pub type RequestId = u64;

/// How a settled query changed the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    /// The whole paragraph was replaced by the answer
    ReplacedLine,
    /// The answer was spliced over the placeholder
    Spliced,
    /// The placeholder became an italic error marker
    ErrorMarker,
}

/// Lifecycle of one inline query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Idle,
    Detected,
    PlaceholderInserted,
    AwaitingResolution,
    Committed(CommitKind),
    Dropped,
}

/// A query between trigger and settle
#[derive(Debug, Clone)]
pub struct InlineQuery {
    pub id: RequestId,
    pub state: ResolutionState,
    pub locator: Locator,
    /// Fixed at trigger time; selects the commit strategy
    pub templated: bool,
    pub request: ResolutionRequest,
}

impl InlineQuery {
    fn transition(&mut self, next: ResolutionState) {
        tracing::debug!("query {}: {:?} -> {:?}", self.id, self.state, next);
        self.state = next;
    }
}

/// What the session should do with a key after the orchestrator saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Not a query; run the default editing behaviour
    Ignored,
    /// The key was consumed and `request` must be sent to the service
    Dispatched {
        id: RequestId,
        request: ResolutionRequest,
    },
}

/// Result of [`Orchestrator::settle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Committed(CommitKind),
    /// The placeholder was gone; the document was left alone
    Dropped,
    /// No in-flight query has this id
    Unknown,
}

#[derive(Debug)]
pub struct Orchestrator {
    next_id: RequestId,
    in_flight: HashMap<RequestId, InlineQuery>,
    preceding_limit: usize,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_PRECEDING_LIMIT)
    }
}

impl Orchestrator {
    pub fn new(preceding_limit: usize) -> Self {
        Self {
            next_id: 1,
            in_flight: HashMap::new(),
            preceding_limit,
        }
    }

    /// Number of queries awaiting an answer
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_resolving(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn query(&self, id: RequestId) -> Option<&InlineQuery> {
        self.in_flight.get(&id)
    }

    /// Enter without Shift triggers resolution; every other key is ignored
    pub fn handle_key(&mut self, state: &mut EditorState, key: &KeyEvent) -> KeyDisposition {
        if key.code != KeyCode::Enter || key.modifiers.contains(KeyModifiers::SHIFT) {
            return KeyDisposition::Ignored;
        }
        self.trigger(state)
    }

    /// Try to start resolving the query under the cursor
    pub fn trigger(&mut self, state: &mut EditorState) -> KeyDisposition {
        let cursor = state.selection().head;
        let found = match extract(state.doc(), cursor, self.preceding_limit) {
            Extraction::Query(found) => found,
            Extraction::Bare => {
                tracing::debug!("bare trigger at {}, nothing to resolve", cursor);
                return KeyDisposition::Ignored;
            }
            Extraction::NoQuery => return KeyDisposition::Ignored,
        };

        let id = self.next_id;
        self.next_id += 1;
        let request = ResolutionRequest::new(found.query.clone(), found.context.clone());
        let mut query = InlineQuery {
            id,
            state: ResolutionState::Idle,
            locator: Locator {
                from: found.trigger_pos,
                to: found.cursor_pos,
            },
            templated: found.templated,
            request: request.clone(),
        };
        query.transition(ResolutionState::Detected);
        tracing::debug!(
            "query {}: {:?} templated={} context={}",
            id,
            request.question,
            found.templated,
            request.context.is_some()
        );

        query.locator = match placeholder::insert(
            state,
            found.trigger_pos,
            found.cursor_pos,
            RESOLVING_SENTINEL,
        ) {
            Ok(locator) => locator,
            Err(e) => {
                tracing::warn!("query {}: could not insert placeholder: {}", id, e);
                return KeyDisposition::Ignored;
            }
        };
        query.transition(ResolutionState::PlaceholderInserted);
        self.in_flight.insert(id, query);
        KeyDisposition::Dispatched { id, request }
    }

    /// Record that the request for `id` has been handed to the service
    pub fn mark_dispatched(&mut self, id: RequestId) {
        if let Some(query) = self.in_flight.get_mut(&id) {
            query.transition(ResolutionState::AwaitingResolution);
        }
    }

    /// Current state of a query; `Idle` once it has settled or if it never
    /// existed
    pub fn state_of(&self, id: RequestId) -> ResolutionState {
        self.in_flight
            .get(&id)
            .map_or(ResolutionState::Idle, |query| query.state)
    }

    /// Commit the outcome of a query
    ///
    /// The placeholder is located afresh in the current document; if it is
    /// gone the outcome is dropped without touching the document.
    pub fn settle(
        &mut self,
        state: &mut EditorState,
        id: RequestId,
        result: Result<String, ResolutionError>,
    ) -> Settlement {
        let Some(mut query) = self.in_flight.remove(&id) else {
            tracing::warn!("settle for unknown query {}", id);
            return Settlement::Unknown;
        };

        let Some(span) = placeholder::locate(state.doc(), query.locator, RESOLVING_SENTINEL)
        else {
            tracing::debug!("query {}: placeholder no longer in document", id);
            query.transition(ResolutionState::Dropped);
            return Settlement::Dropped;
        };

        let (tr, kind) = match result {
            Ok(answer) if query.templated => {
                let Some(here) = state.doc().resolve(span.start) else {
                    query.transition(ResolutionState::Dropped);
                    return Settlement::Dropped;
                };
                let len = answer.chars().count();
                let tr = Transaction::new("commit answer line")
                    .replace_block(here.block_index, Block::text(answer))
                    .set_selection(Selection::cursor(here.content_start() + len));
                (tr, CommitKind::ReplacedLine)
            }
            Ok(answer) => {
                let len = answer.chars().count();
                let tr = Transaction::new("commit answer")
                    .replace_text(span.start, span.end, vec![TextRun::plain(answer)])
                    .set_selection(Selection::cursor(span.start + len));
                (tr, CommitKind::Spliced)
            }
            Err(e) => {
                tracing::warn!("query {} failed: {}", id, e);
                let len = ERROR_MARKER.chars().count();
                let tr = Transaction::new("commit error marker")
                    .replace_text(
                        span.start,
                        span.end,
                        vec![TextRun::with_marks(ERROR_MARKER, &[Mark::Italic])],
                    )
                    .set_selection(Selection::cursor(span.start + len))
                    .remove_stored_mark(Mark::Italic);
                (tr, CommitKind::ErrorMarker)
            }
        };

        match state.apply(tr) {
            Ok(()) => {
                query.transition(ResolutionState::Committed(kind));
                tracing::info!("query {} committed, templated={}", id, query.templated);
                Settlement::Committed(kind)
            }
            Err(e) => {
                tracing::warn!("query {}: commit failed: {}", id, e);
                query.transition(ResolutionState::Dropped);
                Settlement::Dropped
            }
        }
    }
}
