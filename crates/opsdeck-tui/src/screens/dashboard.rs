//! Infrastructure dashboard — the landing screen.
//!
//! Composes the backend summary, hosts, containers, and services into one
//! view with a LIVE auto-refresh mode. All four snapshots load
//! independently; one failing panel never blanks the rest.

use std::time::Instant;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use tokio::sync::mpsc::UnboundedSender;

use opsdeck_core::model::{DockerConnectionType, DockerSetupRequest, HostType, NewHost, StatusCounts};
use opsdeck_core::{DashboardController, Notice, NoticeLevel};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::form::{FieldCursor, TextField};
use crate::widgets::{fmt, status};

/// Inline host-creation form. Leaving the Docker URL empty creates a
/// plain host; filling it adds a TCP Docker setup to the same request.
struct HostForm {
    name: TextField,
    ip: TextField,
    docker_url: TextField,
    cursor: FieldCursor,
    error: Option<String>,
    busy: bool,
}

impl HostForm {
    fn new() -> Self {
        Self {
            name: TextField::new("Name"),
            ip: TextField::new("IP"),
            docker_url: TextField::new("Docker URL"),
            cursor: FieldCursor::new(3),
            error: None,
            busy: false,
        }
    }

    fn field_mut(&mut self, index: usize) -> &mut TextField {
        match index {
            0 => &mut self.name,
            1 => &mut self.ip,
            _ => &mut self.docker_url,
        }
    }

    /// Validate and build the request. Validation errors surface inline.
    fn submission(&mut self) -> Option<NewHost> {
        if self.name.value().trim().is_empty() {
            self.error = Some("name is required".into());
            return None;
        }

        let docker_url = self.docker_url.value().trim().to_owned();
        let docker_setup = (!docker_url.is_empty()).then(|| DockerSetupRequest {
            connection_type: DockerConnectionType::Tcp,
            socket_path: None,
            tcp_url: Some(docker_url),
            collect_stats: true,
        });

        let ip = self.ip.value().trim();
        Some(NewHost {
            name: self.name.value().trim().to_owned(),
            host_type: HostType::Server,
            ip: (!ip.is_empty()).then(|| ip.to_owned()),
            docker_setup,
            ..NewHost::default()
        })
    }
}

/// Dashboard screen state.
pub struct DashboardScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    ctrl: DashboardController,
    notice: Option<(Notice, Instant)>,
    /// Pulse phase for LIVE-mode status dots, flipped on ticks.
    pulse: bool,
    form: Option<HostForm>,
}

impl DashboardScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            action_tx: None,
            ctrl: DashboardController::new(),
            notice: None,
            pulse: false,
            form: None,
        }
    }

    fn dispatch(&self, action: Action) {
        if let Some(tx) = &self.action_tx {
            let _ = tx.send(action);
        }
    }

    fn reload(&mut self) {
        let token = self.ctrl.begin_reload();
        self.dispatch(Action::FetchDashboard { token });
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

    // ── Rendering ────────────────────────────────────────────────────

    fn render_counts(&self, frame: &mut Frame, area: Rect, title: &str, counts: &StatusCounts) {
        let block = Block::default()
            .title(format!(" {title} "))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = vec![Line::from(vec![Span::styled(
            format!("  {}", counts.total),
            Style::default()
                .fg(theme::accent())
                .add_modifier(Modifier::BOLD),
        )])];

        for (token, count) in &counts.by_status {
            lines.push(Line::from(vec![
                Span::raw("  "),
                status::status_dot_pulse(token, self.ctrl.live(), self.pulse),
                Span::styled(
                    format!(" {count} {token}"),
                    Style::default().fg(theme::text()),
                ),
            ]));
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_incidents(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Incidents ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(summary) = &self.ctrl.summary else {
            return;
        };

        let mut lines = vec![Line::from(Span::styled(
            format!("  {} active", summary.incidents.active),
            Style::default().fg(if summary.incidents.active > 0 {
                theme::danger()
            } else {
                theme::success()
            }),
        ))];

        let max_rows = inner.height.saturating_sub(2) as usize;
        for incident in summary.incidents.recent.iter().take(max_rows) {
            lines.push(Line::from(vec![
                Span::raw("  "),
                status::severity_dot(incident.severity),
                Span::styled(
                    format!(" {}", fmt::truncate(&incident.title, inner.width.saturating_sub(6) as usize)),
                    Style::default().fg(theme::text()),
                ),
            ]));
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_hosts(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Hosts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.ctrl.hosts.is_empty() {
            frame.render_widget(
                Paragraph::new("  No hosts registered — press n to add one")
                    .style(theme::key_hint()),
                inner,
            );
            return;
        }

        let mut lines = Vec::new();
        let max_rows = inner.height as usize;
        for host in self.ctrl.hosts.iter().take(max_rows) {
            let last_seen = host
                .last_seen_at
                .map(fmt::relative_time)
                .unwrap_or_else(|| "--".into());

            lines.push(Line::from(vec![
                Span::raw("  "),
                status::status_dot_pulse(host.status.as_str(), self.ctrl.live(), self.pulse),
                Span::styled(
                    format!(" {:<18}", fmt::truncate(&host.name, 18)),
                    Style::default().fg(theme::text()),
                ),
                Span::styled(
                    format!("{:<14}", fmt::opt(host.ip.as_deref())),
                    Style::default().fg(theme::info()),
                ),
                Span::styled(
                    format!("{:<13}", host.host_type.as_str()),
                    Style::default().fg(theme::dim()),
                ),
                Span::styled(last_seen, Style::default().fg(theme::dim())),
            ]));
        }

        frame.render_widget(Paragraph::new(lines), inner);
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
            Paragraph::new(Line::from(Span::styled(
                format!(" {} ", notice.message),
                Style::default().fg(theme::bg()).bg(color),
            ))),
            area,
        );
    }

    fn render_form(&self, frame: &mut Frame, area: Rect) {
        let Some(form) = &self.form else {
            return;
        };

        let width = 52u16.min(area.width.saturating_sub(4));
        let height = 9u16;
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let popup = Rect::new(x, y, width, height);

        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(" New Host ")
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

        form.name.render(frame, rows[0], form.cursor.index == 0);
        form.ip.render(frame, rows[1], form.cursor.index == 1);
        form.docker_url
            .render(frame, rows[2], form.cursor.index == 2);

        if let Some(error) = &form.error {
            frame.render_widget(
                Paragraph::new(format!("  {error}")).style(Style::default().fg(theme::danger())),
                rows[3],
            );
        }

        let hint = if form.busy {
            "  submitting…"
        } else {
            "  Tab next field · Enter submit · Esc cancel"
        };
        frame.render_widget(Paragraph::new(hint).style(theme::key_hint()), rows[4]);
    }
}

impl Component for DashboardScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        self.reload();
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        // Form captures all input while open.
        if let Some(form) = self.form.as_mut() {
            if form.busy {
                return Ok(None);
            }
            match key.code {
                KeyCode::Esc => {
                    self.form = None;
                }
                KeyCode::Tab | KeyCode::Down => form.cursor.next(),
                KeyCode::BackTab | KeyCode::Up => form.cursor.prev(),
                KeyCode::Enter => {
                    if let Some(new_host) = form.submission() {
                        form.busy = true;
                        return Ok(Some(Action::CreateHost(new_host)));
                    }
                }
                _ => {
                    let index = form.cursor.index;
                    form.field_mut(index).handle_key(key);
                    form.error = None;
                }
            }
            return Ok(None);
        }

        match key.code {
            KeyCode::Char('a') => {
                let on = self.ctrl.toggle_auto_refresh();
                Ok(Some(Action::SetAutoRefresh(on)))
            }
            KeyCode::Char('r') => {
                self.reload();
                Ok(None)
            }
            KeyCode::Char('n') => {
                self.form = Some(HostForm::new());
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::Tick => {
                self.expire_notice();
                if self.ctrl.live() {
                    self.pulse = !self.pulse;
                }
            }

            // Poller tick — only meaningful while LIVE mode is on.
            Action::PollDashboard => {
                if self.ctrl.auto_refresh {
                    let token = self.ctrl.begin_reload();
                    return Ok(Some(Action::FetchDashboard { token }));
                }
            }

            Action::DashboardLoaded { token, load } => {
                self.ctrl.apply_load(*token, load.clone());
            }

            Action::HostCreated(response) => {
                self.form = None;
                self.set_notice(DashboardController::host_created(response));
                self.reload();
            }

            Action::HostCreateFailed(err) => {
                if let Some(form) = self.form.as_mut() {
                    form.busy = false;
                    form.error = Some(err.to_string());
                }
            }

            Action::ActionFailed(err) if self.focused => {
                self.set_notice(Notice::error(err.to_string(), std::time::Duration::from_secs(6)));
            }

            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let mut title_spans = vec![Span::styled(" Infrastructure ", theme::title_style())];
        if self.ctrl.live() {
            title_spans.push(Span::styled(
                " LIVE ",
                Style::default()
                    .fg(theme::bg())
                    .bg(theme::success())
                    .add_modifier(Modifier::BOLD),
            ));
        }
        if let Some(error) = &self.ctrl.error {
            title_spans.push(Span::styled(
                format!(" {} ", fmt::truncate(error, 48)),
                Style::default().fg(theme::danger()),
            ));
        }

        let block = Block::default()
            .title(Line::from(title_spans))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.ctrl.loading {
            frame.render_widget(
                Paragraph::new("  Loading…").style(theme::key_hint()),
                inner,
            );
            return;
        }

        let rows = Layout::vertical([
            Constraint::Length(1), // notice strip
            Constraint::Length(7), // count panels
            Constraint::Min(6),    // hosts + incidents
            Constraint::Length(1), // key hints
        ])
        .split(inner);

        self.render_notice(frame, rows[0]);

        if let Some(summary) = &self.ctrl.summary {
            let panels = Layout::horizontal([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(rows[1]);

            self.render_counts(frame, panels[0], "Hosts", &summary.hosts);
            self.render_counts(frame, panels[1], "Containers", &summary.containers);
            self.render_counts(frame, panels[2], "Services", &summary.services);
        }

        let bottom = Layout::horizontal([Constraint::Min(40), Constraint::Length(34)]).split(rows[2]);
        self.render_hosts(frame, bottom[0]);
        self.render_incidents(frame, bottom[1]);

        frame.render_widget(
            Paragraph::new(" a auto-refresh · r reload · n new host").style(theme::key_hint()),
            rows[3],
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
        "Dashboard"
    }
}
