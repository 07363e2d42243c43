//! Incident log — status-filtered timeline with lifecycle transitions.

use std::time::{Duration, Instant};

use chrono::Utc;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use tokio::sync::mpsc::UnboundedSender;

use opsdeck_core::model::{IncidentStatus, Severity};
use opsdeck_core::{IncidentController, Notice, NoticeLevel};

use crate::action::{Action, ConfirmAction};
use crate::component::Component;
use crate::theme;
use crate::widgets::form::{FieldCursor, TextField};
use crate::widgets::{fmt, status};

/// Inline incident-creation form. Severity cycles with ←/→; new incidents
/// start `active` — `resolved_at` is never set from here, the server
/// stamps it on resolve.
struct IncidentForm {
    title: TextField,
    description: TextField,
    severity: usize,
    cursor: FieldCursor,
    error: Option<String>,
    busy: bool,
}

const SEVERITIES: [Severity; 4] = [
    Severity::Critical,
    Severity::High,
    Severity::Medium,
    Severity::Low,
];

impl IncidentForm {
    fn new() -> Self {
        Self {
            title: TextField::new("Title"),
            description: TextField::new("Description"),
            severity: 1, // high
            cursor: FieldCursor::new(3),
            error: None,
            busy: false,
        }
    }

    fn severity(&self) -> Severity {
        SEVERITIES[self.severity % SEVERITIES.len()]
    }
}

pub struct IncidentsScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    ctrl: IncidentController,
    cursor: usize,
    form: Option<IncidentForm>,
    notice: Option<(Notice, Instant)>,
}

impl IncidentsScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            action_tx: None,
            ctrl: IncidentController::new(),
            cursor: 0,
            form: None,
            notice: None,
        }
    }

    fn dispatch(&self, action: Action) {
        if let Some(tx) = &self.action_tx {
            let _ = tx.send(action);
        }
    }

    fn reload(&mut self) {
        let token = self.ctrl.begin_reload();
        self.dispatch(Action::FetchIncidents {
            token,
            filter: self.ctrl.filter,
        });
    }

    fn set_notice(&mut self, notice: Notice) {
        self.notice = Some((notice, Instant::now()));
    }

    fn expire_notice(&mut self) {
        if let Some((notice, shown_at)) = &self.notice {
            if shown_at.elapsed() >= notice.ttl {
                self.notice = None;
            }
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Option<Action> {
        let form = self.form.as_mut()?;
        if form.busy {
            return None;
        }

        match key.code {
            KeyCode::Esc => {
                self.form = None;
            }
            KeyCode::Tab | KeyCode::Down => form.cursor.next(),
            KeyCode::BackTab | KeyCode::Up => form.cursor.prev(),
            KeyCode::Left if form.cursor.index == 2 => {
                form.severity = (form.severity + SEVERITIES.len() - 1) % SEVERITIES.len();
            }
            KeyCode::Right if form.cursor.index == 2 => {
                form.severity = (form.severity + 1) % SEVERITIES.len();
            }
            KeyCode::Enter => {
                let description = form.description.value().trim();
                match IncidentController::validate_new(
                    form.title.value(),
                    form.severity(),
                    IncidentStatus::Active,
                    Utc::now(),
                    None,
                    (!description.is_empty()).then(|| description.to_owned()),
                    None,
                ) {
                    Ok(new_incident) => {
                        form.busy = true;
                        return Some(Action::CreateIncident(new_incident));
                    }
                    Err(err) => {
                        // Validation errors surface inline in the form.
                        form.error = Some(err.to_string());
                    }
                }
            }
            _ => {
                match form.cursor.index {
                    0 => form.title.handle_key(key),
                    1 => form.description.handle_key(key),
                    _ => {}
                }
                form.error = None;
            }
        }
        None
    }

    fn render_list(&self, frame: &mut Frame, area: Rect) {
        if self.ctrl.incidents.is_empty() {
            frame.render_widget(
                Paragraph::new("  No incidents for this filter — press n to log one")
                    .style(theme::key_hint()),
                area,
            );
            return;
        }

        let mut lines = Vec::new();
        for (idx, incident) in self.ctrl.incidents.iter().enumerate() {
            let row_style = if idx == self.cursor {
                theme::selected_row()
            } else {
                theme::table_row()
            };

            let mut spans = vec![
                Span::raw("  "),
                status::severity_dot(incident.severity),
                Span::styled(
                    format!(" {:<32}", fmt::truncate(&incident.title, 32)),
                    row_style,
                ),
                status::status_pill(incident.status.as_str()),
                Span::styled(
                    format!("  {}", incident.started_at.format("%b %-d %H:%M")),
                    Style::default().fg(theme::dim()),
                ),
            ];

            if let Some(resolved_at) = incident.resolved_at {
                spans.push(Span::styled(
                    format!(" → {}", resolved_at.format("%b %-d %H:%M")),
                    Style::default().fg(theme::success()),
                ));
            }

            lines.push(Line::from(spans));

            if idx == self.cursor {
                if let Some(description) = &incident.description {
                    lines.push(Line::from(Span::styled(
                        format!("      {}", fmt::truncate(description, 70)),
                        Style::default().fg(theme::dim()),
                    )));
                }
                if let Some(resolution) = &incident.resolution {
                    lines.push(Line::from(Span::styled(
                        format!("      resolution: {}", fmt::truncate(resolution, 58)),
                        Style::default().fg(theme::success()),
                    )));
                }
            }
        }

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_notice(&self, frame: &mut Frame, area: Rect) {
        let Some((notice, _)) = &self.notice else {
            return;
        };

        let color = match notice.level {
            NoticeLevel::Success => theme::success(),
            NoticeLevel::Info => theme::info(),
            NoticeLevel::Warning => theme::warning(),
            NoticeLevel::Error => theme::danger(),
        };

        frame.render_widget(
            Paragraph::new(Span::styled(
                format!(" {} ", notice.message),
                Style::default().fg(theme::bg()).bg(color),
            )),
            area,
        );
    }

    fn render_form(&self, frame: &mut Frame, area: Rect) {
        let Some(form) = &self.form else { return };

        let width = 56u16.min(area.width.saturating_sub(4));
        let height = 9u16;
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let popup = Rect::new(x, y, width, height);

        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(" Log Incident ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

        form.title.render(frame, rows[0], form.cursor.index == 0);
        form.description.render(frame, rows[1], form.cursor.index == 1);

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(
                    "  Severity    ",
                    if form.cursor.index == 2 {
                        Style::default().fg(theme::accent())
                    } else {
                        Style::default().fg(theme::dim())
                    },
                ),
                Span::styled(
                    format!("◂ {} ▸", form.severity().as_str()),
                    Style::default().fg(status::severity_color(form.severity())),
                ),
            ])),
            rows[2],
        );

        if let Some(error) = &form.error {
            frame.render_widget(
                Paragraph::new(format!("  {error}")).style(Style::default().fg(theme::danger())),
                rows[3],
            );
        }

        let hint = if form.busy {
            "  submitting…"
        } else {
            "  Tab next field · ←/→ severity · Enter submit · Esc cancel"
        };
        frame.render_widget(Paragraph::new(hint).style(theme::key_hint()), rows[4]);
    }
}

impl Component for IncidentsScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        self.reload();
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.form.is_some() {
            return Ok(self.handle_form_key(key));
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if !self.ctrl.incidents.is_empty() {
                    self.cursor = (self.cursor + 1).min(self.ctrl.incidents.len() - 1);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Char('f') => {
                let token = self.ctrl.set_filter(self.ctrl.filter.next());
                self.cursor = 0;
                return Ok(Some(Action::FetchIncidents {
                    token,
                    filter: self.ctrl.filter,
                }));
            }
            KeyCode::Char('r') => {
                if let Some(incident) = self.ctrl.incidents.get(self.cursor) {
                    if let Some(patch) = IncidentController::resolve_patch(incident) {
                        return Ok(Some(Action::ResolveIncident {
                            id: incident.id,
                            patch,
                        }));
                    }
                }
            }
            KeyCode::Char('n') => {
                self.form = Some(IncidentForm::new());
            }
            KeyCode::Char('x') => {
                if let Some(incident) = self.ctrl.incidents.get(self.cursor) {
                    return Ok(Some(Action::ShowConfirm(ConfirmAction::DeleteIncident {
                        id: incident.id,
                        title: incident.title.clone(),
                    })));
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::Tick => self.expire_notice(),

            Action::IncidentsLoaded { token, incidents } => {
                if self.ctrl.apply_incidents(*token, incidents.clone()) {
                    self.cursor = self.cursor.min(self.ctrl.incidents.len().saturating_sub(1));
                }
            }

            Action::IncidentCreated(_) => {
                self.form = None;
                self.set_notice(Notice::success("Incident logged", Duration::from_secs(5)));
                self.reload();
            }

            Action::IncidentUpdated(incident) => {
                self.set_notice(Notice::success(
                    format!("\"{}\" resolved", fmt::truncate(&incident.title, 32)),
                    Duration::from_secs(5),
                ));
                self.reload();
            }

            Action::IncidentDeleted(_) => {
                self.reload();
            }

            Action::ActionFailed(err) if self.focused => {
                if let Some(form) = self.form.as_mut() {
                    form.busy = false;
                    form.error = Some(err.to_string());
                } else {
                    self.set_notice(Notice::error(err.to_string(), Duration::from_secs(6)));
                }
            }

            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(Line::from(vec![
                Span::styled(" Incidents ", theme::title_style()),
                Span::styled(
                    format!(" {} ", self.ctrl.filter.label()),
                    Style::default().fg(theme::bg()).bg(theme::accent()),
                ),
            ]))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .split(inner);

        self.render_notice(frame, rows[0]);
        self.render_list(frame, rows[1]);
        frame.render_widget(
            Paragraph::new(" f filter · r resolve · n new · x delete").style(theme::key_hint()),
            rows[2],
        );

        self.render_form(frame, area);
    }

    fn wants_input(&self) -> bool {
        self.form.is_some()
    }

    fn focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "Incidents"
    }
}
