//! Network devices — a plain status list. CRUD passes through the same
//! HTTP client; the console only lists and colors.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tokio::sync::mpsc::UnboundedSender;

use opsdeck_core::model::NetworkDevice;

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::{fmt, status};

pub struct NetworkScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    devices: Vec<NetworkDevice>,
    cursor: usize,
    generation: u64,
}

impl NetworkScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            action_tx: None,
            devices: Vec::new(),
            cursor: 0,
            generation: 0,
        }
    }

    fn reload(&mut self) {
        self.generation += 1;
        if let Some(tx) = &self.action_tx {
            let _ = tx.send(Action::FetchNetwork {
                token: self.generation,
            });
        }
    }
}

impl Component for NetworkScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        self.reload();
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if !self.devices.is_empty() {
                    self.cursor = (self.cursor + 1).min(self.devices.len() - 1);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::NetworkLoaded { token, devices } = action {
            if *token == self.generation {
                self.devices = devices.clone();
                self.cursor = self.cursor.min(self.devices.len().saturating_sub(1));
            }
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Network ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.devices.is_empty() {
            frame.render_widget(
                Paragraph::new("  No network devices registered").style(theme::key_hint()),
                inner,
            );
            return;
        }

        let mut lines = Vec::new();
        for (idx, device) in self.devices.iter().enumerate() {
            let style = if idx == self.cursor {
                theme::selected_row()
            } else {
                theme::table_row()
            };

            lines.push(Line::from(vec![
                Span::raw("  "),
                status::status_dot(device.status.as_str()),
                Span::styled(
                    format!(" {:<20}", fmt::truncate(&device.name, 20)),
                    style,
                ),
                Span::styled(
                    format!("{:<10}", device.device_type.as_str()),
                    Style::default().fg(theme::dim()),
                ),
                Span::styled(
                    format!("{:<16}", fmt::opt(device.ip.as_deref())),
                    Style::default().fg(theme::info()),
                ),
                Span::styled(
                    format!(
                        "{} {}",
                        fmt::opt(device.manufacturer.as_deref()),
                        device.model.as_deref().unwrap_or("")
                    ),
                    Style::default().fg(theme::dim()),
                ),
            ]));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  j/k move · r reload",
            theme::key_hint(),
        )));

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "Network"
    }
}
