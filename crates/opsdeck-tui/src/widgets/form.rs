//! Inline form fields.
//!
//! Forms collect input and hand a finished submission back to their screen
//! as an Action — they never call the HTTP client themselves, which keeps
//! a double-submit race impossible (the busy flag lives with the screen).

use crossterm::event::{Event as CrosstermEvent, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use crate::theme;

/// A labeled single-line text field.
pub struct TextField {
    pub label: &'static str,
    pub input: Input,
}

impl TextField {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            input: Input::default(),
        }
    }

    pub fn with_value(label: &'static str, value: &str) -> Self {
        Self {
            label,
            input: Input::new(value.to_owned()),
        }
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    /// Feed a key event into the field.
    pub fn handle_key(&mut self, key: KeyEvent) {
        self.input.handle_event(&CrosstermEvent::Key(key));
    }

    /// Render as one line: label, value, cursor block when focused.
    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let label_style = if focused {
            Style::default().fg(theme::accent())
        } else {
            Style::default().fg(theme::dim())
        };

        let mut spans = vec![
            Span::styled(format!("  {:<12}", self.label), label_style),
            Span::styled(self.input.value().to_owned(), Style::default().fg(theme::text())),
        ];
        if focused {
            spans.push(Span::styled("▏", Style::default().fg(theme::accent())));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

/// Field-cycling state for a fixed-size form.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldCursor {
    pub index: usize,
    pub len: usize,
}

impl FieldCursor {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn next(&mut self) {
        if self.len > 0 {
            self.index = (self.index + 1) % self.len;
        }
    }

    pub fn prev(&mut self) {
        if self.len > 0 {
            self.index = (self.index + self.len - 1) % self.len;
        }
    }
}
