use super::{Editor, Focus};
use crate::model::document::{Block, BlockKind, Mark};
use crate::view::annotator::{compute_decorations, DecorationKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::ops::Range;
use unicode_width::UnicodeWidthStr;

/// Status row text while a query is in flight
pub const THINKING: &str = "Thinking...";

impl Editor {
    /// Render the editor to the terminal
    ///
    /// Layout: title row, separator, document body, status row.
    pub fn render(&mut self, frame: &mut Frame) {
        let _span = tracing::trace_span!("render").entered();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(frame.area());

        self.render_title(frame, chunks[0]);
        frame.render_widget(
            Paragraph::new("\u{2500}".repeat(chunks[1].width as usize))
                .style(Style::default().fg(Color::DarkGray)),
            chunks[1],
        );
        self.render_body(frame, chunks[2]);
        self.render_status(frame, chunks[3]);
    }

    fn render_title(&self, frame: &mut Frame, area: Rect) {
        let style = Style::default().add_modifier(Modifier::BOLD);
        frame.render_widget(Paragraph::new(Span::styled(self.title.text().to_string(), style)), area);
        if self.focus == Focus::Title {
            let x = area.x + (self.title.cursor_column() as u16).min(area.width.saturating_sub(1));
            frame.set_cursor_position(Position::new(x, area.y));
        }
    }

    fn render_body(&mut self, frame: &mut Frame, area: Rect) {
        let doc = self.state.doc().clone();
        let decorations = compute_decorations(&doc);
        let head = self.state.resolved_head();

        // One row per block; keep the cursor row visible
        let height = area.height as usize;
        if let Some(here) = head {
            if here.block_index < self.scroll {
                self.scroll = here.block_index;
            } else if height > 0 && here.block_index >= self.scroll + height {
                self.scroll = here.block_index + 1 - height;
            }
        }

        let lines: Vec<Line> = doc
            .blocks()
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(height)
            .map(|(index, block)| {
                let decoration = decorations.iter().find(|d| d.block_index == index);
                match decoration {
                    Some(d) if d.kind == DecorationKind::EmptyDocument => Line::from(Span::styled(
                        self.config.editor.empty_document_hint.clone(),
                        d.kind.style(),
                    )),
                    Some(d) => block_line(block, area.width, Some((d.offsets(&doc), d.kind.style()))),
                    None => block_line(block, area.width, None),
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), area);

        if self.focus == Focus::Body {
            if let Some(here) = head {
                let text = doc
                    .block(here.block_index)
                    .map(Block::text_content)
                    .unwrap_or_default();
                let before = crate::model::document::char_slice(&text, 0..here.offset);
                let column = (before.width() as u16).min(area.width.saturating_sub(1));
                let row = (here.block_index - self.scroll) as u16;
                frame.set_cursor_position(Position::new(area.x + column, area.y + row));
            }
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let text = match self.orchestrator.in_flight() {
            0 => self.status_message.clone().unwrap_or_default(),
            1 => THINKING.to_string(),
            n => format!("{} ({})", THINKING, n),
        };
        frame.render_widget(
            Paragraph::new(text).style(Style::default().add_modifier(Modifier::REVERSED)),
            area,
        );
    }
}

fn mark_style(marks: &[Mark]) -> Style {
    marks.iter().fold(Style::default(), |style, mark| match mark {
        Mark::Bold => style.add_modifier(Modifier::BOLD),
        Mark::Italic => style.add_modifier(Modifier::ITALIC),
    })
}

/// Spans for one block, with `highlight` patched over the given character
/// offsets
fn block_line(block: &Block, width: u16, highlight: Option<(Range<usize>, Style)>) -> Line<'static> {
    let runs = match &block.kind {
        BlockKind::Rule => {
            return Line::from(Span::styled(
                "\u{2500}".repeat(width as usize),
                Style::default().fg(Color::DarkGray),
            ))
        }
        BlockKind::Paragraph(runs) => runs,
    };

    let mut spans = Vec::new();
    let mut offset = 0;
    for run in runs {
        let len = run.char_len();
        let base = mark_style(&run.marks);
        let mut cuts = vec![0, len];
        if let Some((range, _)) = &highlight {
            for cut in [range.start, range.end] {
                if cut > offset && cut < offset + len {
                    cuts.push(cut - offset);
                }
            }
        }
        cuts.sort_unstable();
        cuts.dedup();
        for pair in cuts.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            let text = crate::model::document::char_slice(&run.text, lo..hi).to_string();
            let style = match &highlight {
                Some((range, style)) if range.contains(&(offset + lo)) => base.patch(*style),
                _ => base,
            };
            spans.push(Span::styled(text, style));
        }
        offset += len;
    }
    Line::from(spans)
}
