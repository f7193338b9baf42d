//! Editor session
//!
//! Owns the document state, the title field, focus, the query orchestrator
//! and the async plumbing used to reach the Resolution Service. All document
//! mutation happens on the thread that calls [`Editor::handle_key`] and
//! [`Editor::process_async_messages`].

mod render;

use crate::config::Config;
use crate::input::handler::{
    is_key_with_ctrl, typed_char, InputContext, InputHandler, InputResult,
};
use crate::input::title_field::TitleField;
use crate::model::document::Document;
use crate::model::transaction::EditError;
use crate::query::{KeyDisposition, Orchestrator, RequestId, Settlement};
use crate::services::async_bridge::{AsyncBridge, AsyncMessage};
use crate::services::resolution::{ResolutionError, ResolutionRequest, ResolutionService};
use crate::state::EditorState;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;

/// Status shown when the terminal reports Shift+Enter as plain Enter
pub const SHIFT_ENTER_UNAVAILABLE: &str =
    "Terminal cannot tell Shift+Enter from Enter; Enter after a /query resolves it";

/// Which field receives typed text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Title,
    Body,
}

pub struct Editor {
    config: Config,
    state: EditorState,
    title: TitleField,
    focus: Focus,
    orchestrator: Orchestrator,
    service: Arc<dyn ResolutionService>,
    async_bridge: AsyncBridge,
    tokio_runtime: Option<tokio::runtime::Runtime>,
    status_message: Option<String>,
    should_quit: bool,
    /// First visible body row
    scroll: usize,
}

impl Editor {
    pub fn new(config: Config, service: Arc<dyn ResolutionService>, doc: Document) -> Self {
        let tokio_runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("seemless-async")
            .enable_all()
            .build()
            .ok();
        if tokio_runtime.is_none() {
            tracing::warn!("Failed to create Tokio runtime - queries will fail");
        }

        Self {
            title: TitleField::new(config.editor.default_title.clone()),
            orchestrator: Orchestrator::new(config.editor.preceding_block_limit),
            state: EditorState::new(doc),
            focus: Focus::Body,
            service,
            async_bridge: AsyncBridge::new(),
            tokio_runtime,
            status_message: None,
            should_quit: false,
            scroll: 0,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn document(&self) -> &Document {
        self.state.doc()
    }

    pub fn title(&self) -> &str {
        self.title.text()
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Record whether the terminal disambiguates modified keys. Without it
    /// Shift+Enter arrives as Enter and always triggers a pending query.
    pub fn set_keyboard_enhancement(&mut self, enabled: bool) {
        if enabled {
            tracing::debug!("keyboard enhancement enabled");
        } else {
            tracing::warn!("keyboard enhancement unsupported, Shift+Enter reads as Enter");
            self.status_message = Some(SHIFT_ENTER_UNAVAILABLE.to_string());
        }
    }

    /// Whether any query is waiting for the service
    pub fn is_resolving(&self) -> bool {
        self.orchestrator.is_resolving()
    }

    pub fn in_flight(&self) -> usize {
        self.orchestrator.in_flight()
    }

    /// Handle one key press
    pub fn handle_key(&mut self, event: KeyEvent) -> InputResult {
        let mut ctx = InputContext::new();
        let result = self.dispatch_input(&event, &mut ctx);
        if let Some(msg) = ctx.status_message {
            self.status_message = Some(msg);
        }
        result
    }

    /// Send a request to the service on the async runtime
    fn dispatch(&mut self, id: RequestId, request: ResolutionRequest) {
        let Some(runtime) = &self.tokio_runtime else {
            self.settle(
                id,
                Err(ResolutionError::Unavailable(
                    "async runtime not available".to_string(),
                )),
            );
            return;
        };

        let service = Arc::clone(&self.service);
        let sender = self.async_bridge.sender();
        runtime.spawn(async move {
            let result = service.resolve(request).await;
            if sender
                .send(AsyncMessage::ResolutionSettled {
                    request_id: id,
                    result,
                })
                .is_err()
            {
                tracing::debug!("editor gone before query {} settled", id);
            }
        });
        self.orchestrator.mark_dispatched(id);
    }

    /// Apply settled queries. Returns true when anything changed.
    pub fn process_async_messages(&mut self) -> bool {
        let messages = self.async_bridge.try_recv_all();
        let needs_render = !messages.is_empty();

        for message in messages {
            match message {
                AsyncMessage::ResolutionSettled { request_id, result } => {
                    self.settle(request_id, result);
                }
            }
        }

        needs_render
    }

    fn settle(&mut self, id: RequestId, result: Result<String, ResolutionError>) {
        let failure = result.as_ref().err().map(|e| e.to_string());
        match self.orchestrator.settle(&mut self.state, id, result) {
            Settlement::Committed(_) => {
                self.focus = Focus::Body;
                self.status_message = failure.map(|e| format!("Query failed: {}", e));
            }
            Settlement::Dropped => {
                self.status_message = Some("Query dropped: placeholder was removed".to_string());
            }
            Settlement::Unknown => {}
        }
    }

    /// Default body editing for keys the orchestrator did not take
    fn edit_body(&mut self, event: &KeyEvent) -> Result<InputResult, EditError> {
        if let Some(c) = typed_char(event) {
            let mut buf = [0u8; 4];
            self.state.insert_text(c.encode_utf8(&mut buf))?;
            return Ok(InputResult::Consumed);
        }
        match event.code {
            KeyCode::Enter => self.state.split_block()?,
            KeyCode::Backspace => self.state.delete_backward()?,
            KeyCode::Delete => self.state.delete_forward()?,
            KeyCode::Left => self.state.move_left(),
            KeyCode::Right => self.state.move_right(),
            KeyCode::Up => self.state.move_up(),
            KeyCode::Down => self.state.move_down(),
            KeyCode::Home => self.state.move_home(),
            KeyCode::End => self.state.move_end(),
            _ => return Ok(InputResult::Ignored),
        }
        Ok(InputResult::Consumed)
    }
}

impl InputHandler for Editor {
    fn handle_key_event(&mut self, event: &KeyEvent, ctx: &mut InputContext) -> InputResult {
        if is_key_with_ctrl(event, 'q') || is_key_with_ctrl(event, 'c') {
            self.should_quit = true;
            return InputResult::Consumed;
        }
        match event.code {
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Title => Focus::Body,
                    Focus::Body => Focus::Title,
                };
                return InputResult::Consumed;
            }
            KeyCode::Esc => {
                self.focus = Focus::Body;
                return InputResult::Consumed;
            }
            _ => {}
        }

        match self.focus {
            // Enter in the title moves on to the body
            Focus::Title => {
                if event.code == KeyCode::Enter {
                    self.focus = Focus::Body;
                    InputResult::Consumed
                } else {
                    InputResult::Ignored
                }
            }
            Focus::Body => {
                if let KeyDisposition::Dispatched { id, request } =
                    self.orchestrator.handle_key(&mut self.state, event)
                {
                    self.dispatch(id, request);
                    return InputResult::Consumed;
                }
                match self.edit_body(event) {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::warn!("edit failed: {}", e);
                        ctx.set_status(format!("Edit failed: {}", e));
                        InputResult::Consumed
                    }
                }
            }
        }
    }

    fn focused_child_mut(&mut self) -> Option<&mut dyn InputHandler> {
        match self.focus {
            Focus::Title => Some(&mut self.title),
            Focus::Body => None,
        }
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        if let Some(runtime) = self.tokio_runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Modifier-free key event, handy for scripted input
pub fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}
