// EditorTestHarness - Virtual terminal environment for E2E testing

use super::scripted_service::ScriptedService;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{backend::TestBackend, Terminal};
use seemless::app::Editor;
use seemless::config::Config;
use seemless::model::document::Document;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Terminal layout constants
pub mod layout {
    /// Title field row
    pub const TITLE_ROW: u16 = 0;

    /// Separator between title and body
    pub const SEPARATOR_ROW: u16 = 1;

    /// First document row
    pub const BODY_START_ROW: u16 = 2;

    /// Status row for a given terminal height
    #[inline]
    pub const fn status_row(terminal_height: u16) -> u16 {
        terminal_height - 1
    }
}

/// Upper bound for `wait_until`
const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct EditorTestHarness {
    editor: Editor,
    terminal: Terminal<TestBackend>,
    service: Arc<ScriptedService>,
}

impl EditorTestHarness {
    /// Empty document, default config, service answering "42"
    pub fn new(width: u16, height: u16) -> io::Result<Self> {
        Self::with_text(width, height, "", ScriptedService::answering("42"))
    }

    /// Document seeded from `text` (one paragraph per line), cursor at the
    /// end of the last line
    pub fn with_text(
        width: u16,
        height: u16,
        text: &str,
        service: ScriptedService,
    ) -> io::Result<Self> {
        Self::with_config(width, height, text, service, Config::default())
    }

    pub fn with_config(
        width: u16,
        height: u16,
        text: &str,
        service: ScriptedService,
        config: Config,
    ) -> io::Result<Self> {
        let service = Arc::new(service);
        let editor = Editor::new(config, service.clone(), Document::from_text(text));
        let backend = TestBackend::new(width, height);
        let terminal = Terminal::new(backend)?;
        let mut harness = Self {
            editor,
            terminal,
            service,
        };
        harness.move_to_end()?;
        Ok(harness)
    }

    /// Put the cursor at the end of the last paragraph
    pub fn move_to_end(&mut self) -> io::Result<()> {
        let blocks = self.editor.document().blocks().len();
        for _ in 0..blocks {
            self.editor.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
        }
        self.send_key(KeyCode::End, KeyModifiers::NONE)
    }

    /// Send a key press, then process async messages and render
    pub fn send_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> io::Result<()> {
        self.editor.handle_key(KeyEvent::new(code, modifiers));
        let _ = self.editor.process_async_messages();
        self.render()
    }

    /// Simulate typing a string of text; renders once at the end
    pub fn type_text(&mut self, text: &str) -> io::Result<()> {
        for ch in text.chars() {
            self.editor
                .handle_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
        }
        let _ = self.editor.process_async_messages();
        self.render()
    }

    pub fn render(&mut self) -> io::Result<()> {
        self.terminal.draw(|frame| {
            self.editor.render(frame);
        })?;
        Ok(())
    }

    pub fn process_async_and_render(&mut self) -> io::Result<()> {
        let _ = self.editor.process_async_messages();
        self.render()
    }

    /// Poll async messages until `condition` holds
    pub fn wait_until<F>(&mut self, mut condition: F) -> io::Result<()>
    where
        F: FnMut(&Self) -> bool,
    {
        let start = Instant::now();
        loop {
            self.process_async_and_render()?;
            if condition(&*self) {
                return Ok(());
            }
            if start.elapsed() > WAIT_TIMEOUT {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("condition not met\nScreen content:\n{}", self.screen_to_string()),
                ));
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    /// Wait until no query is in flight
    pub fn wait_for_async(&mut self) -> io::Result<()> {
        self.wait_until(|h| !h.editor().is_resolving())
    }

    /// Wait until the service has received `n` requests
    pub fn wait_for_requests(&mut self, n: usize) -> io::Result<()> {
        self.wait_until(|h| h.service().requests().len() >= n)
    }

    pub fn buffer(&self) -> &ratatui::buffer::Buffer {
        self.terminal.backend().buffer()
    }

    /// Get the style (color, modifiers) of a specific cell
    pub fn get_cell_style(&self, x: u16, y: u16) -> Option<ratatui::style::Style> {
        let buffer = self.buffer();
        let pos = buffer.index_of(x, y);
        buffer.content.get(pos).map(|cell| cell.style())
    }

    /// Get the text content of a specific screen row
    pub fn get_row_text(&self, y: u16) -> String {
        let buffer = self.buffer();
        (0..buffer.area.width)
            .filter_map(|x| buffer.content.get(buffer.index_of(x, y)))
            .map(|cell| cell.symbol())
            .collect()
    }

    /// Get entire screen as string (for debugging)
    pub fn screen_to_string(&self) -> String {
        let height = self.buffer().area.height;
        (0..height)
            .map(|y| self.get_row_text(y))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Verify text appears on screen
    pub fn assert_screen_contains(&self, text: &str) {
        let screen = self.screen_to_string();
        assert!(
            screen.contains(text),
            "Expected screen to contain '{text}'\nScreen content:\n{screen}"
        );
    }

    /// Verify text does not appear on screen
    pub fn assert_screen_not_contains(&self, text: &str) {
        let screen = self.screen_to_string();
        assert!(
            !screen.contains(text),
            "Expected screen to not contain '{text}'\nScreen content:\n{screen}"
        );
    }

    pub fn get_status_bar(&self) -> String {
        let height = self.buffer().area.height;
        self.get_row_text(layout::status_row(height))
    }

    /// Paragraph texts, rules rendered as "---"
    pub fn document_lines(&self) -> Vec<String> {
        self.editor
            .document()
            .blocks()
            .iter()
            .map(|b| {
                if b.is_textblock() {
                    b.text_content()
                } else {
                    "---".to_string()
                }
            })
            .collect()
    }

    pub fn screen_cursor_position(&mut self) -> (u16, u16) {
        let pos = self.terminal.get_cursor_position().unwrap_or_default();
        (pos.x, pos.y)
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn service(&self) -> &ScriptedService {
        &self.service
    }
}
