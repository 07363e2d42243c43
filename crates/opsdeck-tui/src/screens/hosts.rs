//! Hosts screen — fleet list plus the tabbed host detail view.
//!
//! Detail tabs: Overview (hardware, Docker setup), Containers (sync),
//! Services (inline add), Metrics (query engine + chart). Metrics fetch
//! only while their tab is active; parameter changes supersede in-flight
//! fetches via the panel's generation token.

use std::cell::RefCell;
use std::time::Instant;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Block, BorderType, Borders, Chart, Clear, Dataset, Gauge, GraphType, Paragraph, Tabs,
};
use tokio::sync::mpsc::UnboundedSender;

use opsdeck_core::metrics::{
    GAUGE_METRICS, format_metric_value, format_timestamp, format_x_label, gauge_ratio,
};
use opsdeck_core::model::{
    DockerConnectionType, DockerSetupRequest, Host,
};
use opsdeck_core::{HostDetailController, HostTab, Notice, NoticeLevel};

use crate::action::{Action, ConfirmAction};
use crate::component::Component;
use crate::theme;
use crate::widgets::form::{FieldCursor, TextField};
use crate::widgets::{fmt, status};

// ── Inline forms ─────────────────────────────────────────────────────

/// Docker setup: socket-or-TCP connection plus the stats toggle.
struct DockerForm {
    connection_type: DockerConnectionType,
    socket_path: TextField,
    tcp_url: TextField,
    collect_stats: bool,
    cursor: FieldCursor,
    error: Option<String>,
}

impl DockerForm {
    fn new() -> Self {
        Self {
            connection_type: DockerConnectionType::Socket,
            socket_path: TextField::with_value("Socket", "/var/run/docker.sock"),
            tcp_url: TextField::new("TCP URL"),
            collect_stats: true,
            cursor: FieldCursor::new(4),
            error: None,
        }
    }

    fn submission(&mut self) -> Option<DockerSetupRequest> {
        match self.connection_type {
            DockerConnectionType::Socket => {
                let path = self.socket_path.value().trim();
                if path.is_empty() {
                    self.error = Some("socket path is required".into());
                    return None;
                }
                Some(DockerSetupRequest {
                    connection_type: DockerConnectionType::Socket,
                    socket_path: Some(path.to_owned()),
                    tcp_url: None,
                    collect_stats: self.collect_stats,
                })
            }
            DockerConnectionType::Tcp => {
                let url = self.tcp_url.value().trim();
                if url.is_empty() {
                    self.error = Some("TCP URL is required".into());
                    return None;
                }
                Some(DockerSetupRequest {
                    connection_type: DockerConnectionType::Tcp,
                    socket_path: None,
                    tcp_url: Some(url.to_owned()),
                    collect_stats: self.collect_stats,
                })
            }
        }
    }
}

/// Inline add-service form; `host_id` is bound by the controller.
struct ServiceForm {
    name: TextField,
    url: TextField,
    service_type: TextField,
    cursor: FieldCursor,
    error: Option<String>,
    busy: bool,
}

impl ServiceForm {
    fn new() -> Self {
        Self {
            name: TextField::new("Name"),
            url: TextField::new("URL"),
            service_type: TextField::with_value("Type", "http"),
            cursor: FieldCursor::new(3),
            error: None,
            busy: false,
        }
    }
}

// ── Screen ───────────────────────────────────────────────────────────

pub struct HostsScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    hosts: Vec<Host>,
    cursor: usize,
    list_generation: u64,
    /// Open detail view, if any.
    detail: Option<HostDetailController>,
    docker_form: Option<DockerForm>,
    service_form: Option<ServiceForm>,
    notice: Option<(Notice, Instant)>,
    throbber: RefCell<throbber_widgets_tui::ThrobberState>,
}

impl HostsScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            action_tx: None,
            hosts: Vec::new(),
            cursor: 0,
            list_generation: 0,
            detail: None,
            docker_form: None,
            service_form: None,
            notice: None,
            throbber: RefCell::new(throbber_widgets_tui::ThrobberState::default()),
        }
    }

    fn dispatch(&self, action: Action) {
        if let Some(tx) = &self.action_tx {
            let _ = tx.send(action);
        }
    }

    fn reload_list(&mut self) {
        self.list_generation += 1;
        self.dispatch(Action::FetchHosts {
            token: self.list_generation,
        });
    }

    fn open_detail(&mut self, host_id: i64) {
        let mut detail = HostDetailController::new();
        let token = detail.begin_reload();
        self.detail = Some(detail);
        self.dispatch(Action::FetchHost { token, id: host_id });
    }

    fn refresh_detail(&mut self) {
        if let Some(detail) = self.detail.as_mut() {
            if let Some(host) = &detail.host {
                let id = host.id;
                let token = detail.begin_reload();
                self.dispatch(Action::FetchHost { token, id });
            }
        }
    }

    fn fetch_metrics(&mut self, token: u64) {
        let Some(detail) = &self.detail else { return };
        let Some(host) = &detail.host else { return };

        self.dispatch(Action::FetchMetrics {
            token,
            source_id: host.id,
            metric: detail.metrics.metric_name().to_owned(),
            range: detail.metrics.range,
        });
    }

    fn take_controller_notice(&mut self) {
        if let Some(detail) = self.detail.as_mut() {
            if let Some(notice) = detail.notice.take() {
                self.notice = Some((notice, Instant::now()));
            }
        }
    }

    fn expire_notice(&mut self) {
        if let Some((notice, shown_at)) = &self.notice {
            if shown_at.elapsed() >= notice.ttl {
                self.notice = None;
            }
        }
    }

    // ── Key handling ─────────────────────────────────────────────────

    fn handle_docker_form_key(&mut self, key: KeyEvent) -> Option<Action> {
        let busy = self.detail.as_ref().is_some_and(|d| d.docker_busy);
        let form = self.docker_form.as_mut()?;
        if busy {
            return None;
        }

        match key.code {
            KeyCode::Esc => {
                self.docker_form = None;
            }
            KeyCode::Tab | KeyCode::Down => form.cursor.next(),
            KeyCode::BackTab | KeyCode::Up => form.cursor.prev(),
            KeyCode::Left | KeyCode::Right if form.cursor.index == 0 => {
                form.connection_type = match form.connection_type {
                    DockerConnectionType::Socket => DockerConnectionType::Tcp,
                    DockerConnectionType::Tcp => DockerConnectionType::Socket,
                };
            }
            KeyCode::Char(' ') if form.cursor.index == 3 => {
                form.collect_stats = !form.collect_stats;
            }
            KeyCode::Enter => {
                if let Some(request) = form.submission() {
                    let detail = self.detail.as_mut()?;
                    let host_id = detail.host.as_ref()?.id;
                    detail.docker_busy = true;
                    return Some(Action::RequestDockerSetup { host_id, request });
                }
            }
            _ => match form.cursor.index {
                1 => form.socket_path.handle_key(key),
                2 => form.tcp_url.handle_key(key),
                _ => {}
            },
        }
        None
    }

    fn handle_service_form_key(&mut self, key: KeyEvent) -> Option<Action> {
        let form = self.service_form.as_mut()?;
        if form.busy {
            return None;
        }

        match key.code {
            KeyCode::Esc => {
                self.service_form = None;
            }
            KeyCode::Tab | KeyCode::Down => form.cursor.next(),
            KeyCode::BackTab | KeyCode::Up => form.cursor.prev(),
            KeyCode::Enter => {
                let detail = self.detail.as_ref()?;
                match detail.new_service(
                    form.name.value(),
                    form.url.value(),
                    form.service_type.value(),
                ) {
                    Ok(new_service) => {
                        form.busy = true;
                        return Some(Action::AddService(new_service));
                    }
                    Err(err) => {
                        // Validation surfaces inline, in the form.
                        form.error = Some(err.to_string());
                    }
                }
            }
            _ => {
                match form.cursor.index {
                    0 => form.name.handle_key(key),
                    1 => form.url.handle_key(key),
                    _ => form.service_type.handle_key(key),
                }
                form.error = None;
            }
        }
        None
    }

    fn handle_detail_key(&mut self, key: KeyEvent) -> Option<Action> {
        if self.docker_form.is_some() {
            return self.handle_docker_form_key(key);
        }
        if self.service_form.is_some() {
            return self.handle_service_form_key(key);
        }

        let detail = self.detail.as_mut()?;
        match key.code {
            KeyCode::Esc => {
                self.detail = None;
            }
            KeyCode::Tab | KeyCode::Char(']') => {
                let next = detail.tab.next();
                if let Some(token) = detail.set_tab(next) {
                    self.fetch_metrics(token);
                }
            }
            KeyCode::BackTab | KeyCode::Char('[') => {
                let prev = detail.tab.prev();
                if let Some(token) = detail.set_tab(prev) {
                    self.fetch_metrics(token);
                }
            }
            KeyCode::Char('d') if detail.tab == HostTab::Overview => {
                let id = detail.host.as_ref()?.id;
                return Some(Action::DetectHardware(id));
            }
            KeyCode::Char('s') if detail.tab == HostTab::Overview => {
                self.docker_form = Some(DockerForm::new());
            }
            KeyCode::Char('y') if detail.tab == HostTab::Containers => {
                if !detail.sync_busy {
                    detail.sync_busy = true;
                    let id = detail.host.as_ref()?.id;
                    return Some(Action::RequestContainerSync(id));
                }
            }
            KeyCode::Char('a') if detail.tab == HostTab::Services => {
                self.service_form = Some(ServiceForm::new());
            }
            KeyCode::Char('m') if detail.tab == HostTab::Metrics => {
                let token = detail.metrics.cycle_metric();
                self.fetch_metrics(token);
            }
            KeyCode::Char('g') if detail.tab == HostTab::Metrics => {
                let token = detail.metrics.cycle_range();
                self.fetch_metrics(token);
            }
            KeyCode::Char('r') => {
                self.refresh_detail();
            }
            _ => {}
        }
        None
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render_list(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Hosts ")
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

        if self.hosts.is_empty() {
            frame.render_widget(
                Paragraph::new("  No hosts — create one from the dashboard (n)")
                    .style(theme::key_hint()),
                inner,
            );
            return;
        }

        let mut lines = Vec::new();
        for (idx, host) in self.hosts.iter().enumerate() {
            let style = if idx == self.cursor {
                theme::selected_row()
            } else {
                theme::table_row()
            };

            let docker = if host.has_docker_integration {
                "docker"
            } else {
                ""
            };

            lines.push(Line::from(vec![
                Span::raw("  "),
                status::status_dot(host.status.as_str()),
                Span::styled(format!(" {:<20}", fmt::truncate(&host.name, 20)), style),
                Span::styled(
                    format!("{:<14}", fmt::opt(host.ip.as_deref())),
                    Style::default().fg(theme::info()),
                ),
                Span::styled(
                    format!("{:<13}", host.host_type.as_str()),
                    Style::default().fg(theme::dim()),
                ),
                Span::styled(docker, Style::default().fg(theme::accent())),
            ]));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  j/k move · Enter open · x delete · r reload",
            theme::key_hint(),
        )));

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect) {
        let Some(detail) = &self.detail else { return };

        let host_name = detail
            .host
            .as_ref()
            .map_or("loading…", |h| h.name.as_str());

        let block = Block::default()
            .title(format!(" Host · {host_name} "))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::vertical([
            Constraint::Length(1), // tabs
            Constraint::Length(1), // notice
            Constraint::Min(4),    // tab body
            Constraint::Length(1), // hints
        ])
        .split(inner);

        let titles: Vec<Line> = HostTab::ALL
            .iter()
            .map(|t| Line::from(format!(" {} ", t.label())))
            .collect();
        let selected = HostTab::ALL
            .iter()
            .position(|&t| t == detail.tab)
            .unwrap_or(0);
        frame.render_widget(
            Tabs::new(titles)
                .select(selected)
                .highlight_style(theme::tab_active())
                .style(theme::tab_inactive()),
            rows[0],
        );

        self.render_notice(frame, rows[1]);

        match detail.tab {
            HostTab::Overview => self.render_overview(frame, rows[2]),
            HostTab::Containers => self.render_containers(frame, rows[2]),
            HostTab::Services => self.render_services(frame, rows[2]),
            HostTab::Metrics => self.render_metrics(frame, rows[2]),
        }

        let hints = match detail.tab {
            HostTab::Overview => "  Tab switch · d detect hardware · s set up docker · Esc back",
            HostTab::Containers => "  Tab switch · y sync containers · Esc back",
            HostTab::Services => "  Tab switch · a add service · Esc back",
            HostTab::Metrics => "  Tab switch · m metric · g range · Esc back",
        };
        frame.render_widget(Paragraph::new(hints).style(theme::key_hint()), rows[3]);

        self.render_docker_form(frame, area);
        self.render_service_form(frame, area);
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

    fn render_overview(&self, frame: &mut Frame, area: Rect) {
        let Some(detail) = &self.detail else { return };
        let Some(host) = &detail.host else {
            frame.render_widget(Paragraph::new("  Loading…").style(theme::key_hint()), area);
            return;
        };

        let mut lines = vec![
            Line::from(vec![
                Span::raw("  "),
                status::status_pill(host.status.as_str()),
            ]),
            Line::from(""),
            fmt::data_row("type", host.host_type.as_str()),
            fmt::data_row("ip", fmt::opt(host.ip.as_deref())),
            fmt::data_row("mac", fmt::opt(host.mac.as_deref())),
            fmt::data_row(
                "os",
                format!(
                    "{} {}",
                    fmt::opt(host.os_name.as_deref()),
                    host.os_version.as_deref().unwrap_or("")
                ),
            ),
            fmt::data_row("hostname", fmt::opt(host.hostname.as_deref())),
            fmt::data_row("location", fmt::opt(host.location.as_deref())),
            fmt::data_row(
                "last seen",
                host.last_seen_at
                    .map(fmt::relative_time)
                    .unwrap_or_else(|| "--".into()),
            ),
            Line::from(""),
        ];

        if let Some(hw) = &host.hardware {
            lines.push(fmt::data_row("cpu", fmt::opt(hw.cpu.as_deref())));
            lines.push(fmt::data_row(
                "cores",
                hw.cpu_cores
                    .map(|c| {
                        format!("{c} cores / {} threads", hw.cpu_threads.unwrap_or(c))
                    })
                    .unwrap_or_else(|| "--".into()),
            ));
            lines.push(fmt::data_row(
                "ram",
                hw.ram_gb.map(|r| format!("{r:.0} GB")).unwrap_or_else(|| "--".into()),
            ));
            lines.push(fmt::data_row(
                "disk",
                hw.disk_gb.map(|d| format!("{d:.0} GB")).unwrap_or_else(|| "--".into()),
            ));
            lines.push(fmt::data_row("gpu", fmt::opt(hw.gpu.as_deref())));
        } else {
            lines.push(Line::from(Span::styled(
                "  No hardware record — press d to auto-detect",
                theme::key_hint(),
            )));
        }

        lines.push(Line::from(""));
        if host.has_docker_integration {
            lines.push(Line::from(vec![
                Span::styled("  ● ", Style::default().fg(theme::success())),
                Span::styled("Docker integration active", Style::default().fg(theme::text())),
            ]));
        } else {
            lines.push(Line::from(Span::styled(
                "  No Docker integration configured — press s to set up",
                theme::key_hint(),
            )));
        }

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_containers(&self, frame: &mut Frame, area: Rect) {
        let Some(detail) = &self.detail else { return };
        let Some(host) = &detail.host else { return };

        if detail.sync_busy {
            let throbber = throbber_widgets_tui::Throbber::default()
                .label("Syncing containers…")
                .style(Style::default().fg(theme::accent()));
            frame.render_stateful_widget(throbber, area, &mut self.throbber.borrow_mut());
            return;
        }

        if !host.has_docker_integration {
            frame.render_widget(
                Paragraph::new("  No Docker integration configured — containers appear after setup")
                    .style(theme::key_hint()),
                area,
            );
            return;
        }

        if host.containers.is_empty() {
            frame.render_widget(
                Paragraph::new("  No containers — press y to sync").style(theme::key_hint()),
                area,
            );
            return;
        }

        let mut lines = Vec::new();
        for container in &host.containers {
            lines.push(Line::from(vec![
                Span::raw("  "),
                status::status_dot(container.status.as_str()),
                Span::styled(
                    format!(" {:<24}", fmt::truncate(&container.name, 24)),
                    theme::table_row(),
                ),
                Span::styled(
                    fmt::truncate(&container.image, 36),
                    Style::default().fg(theme::dim()),
                ),
            ]));
        }

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_services(&self, frame: &mut Frame, area: Rect) {
        let Some(detail) = &self.detail else { return };
        let Some(host) = &detail.host else { return };

        if host.services.is_empty() {
            frame.render_widget(
                Paragraph::new("  No services — press a to add one").style(theme::key_hint()),
                area,
            );
            return;
        }

        let mut lines = Vec::new();
        for service in &host.services {
            let latency = service
                .last_response_time_ms
                .map(|ms| format!("{ms} ms"))
                .unwrap_or_else(|| "--".into());

            lines.push(Line::from(vec![
                Span::raw("  "),
                status::status_dot(service.status.as_str()),
                Span::styled(
                    format!(" {:<20}", fmt::truncate(&service.name, 20)),
                    theme::table_row(),
                ),
                Span::styled(
                    format!("{:<30}", fmt::truncate(&service.url, 30)),
                    Style::default().fg(theme::info()),
                ),
                Span::styled(latency, Style::default().fg(theme::dim())),
            ]));
        }

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_metrics(&self, frame: &mut Frame, area: Rect) {
        let Some(detail) = &self.detail else { return };
        let panel = &detail.metrics;

        let rows = Layout::vertical([
            Constraint::Length(1), // selector line
            Constraint::Length(3), // gauges
            Constraint::Min(5),    // chart
        ])
        .split(area);

        let mut selector = vec![
            Span::styled("  metric ", theme::key_hint()),
            Span::styled(panel.metric_name(), Style::default().fg(theme::accent())),
            Span::styled("   range ", theme::key_hint()),
            Span::styled(panel.range.label(), Style::default().fg(theme::accent())),
        ];
        if let Some(last) = panel.view.as_ref().and_then(|v| v.series.last()) {
            selector.push(Span::styled(
                format!(
                    "   {} at {}",
                    format_metric_value(panel.metric_name(), last.value),
                    format_timestamp(last.recorded_at, panel.range)
                ),
                theme::key_hint(),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(selector)), rows[0]);

        self.render_gauges(frame, rows[1]);
        self.render_chart(frame, rows[2]);
    }

    fn render_gauges(&self, frame: &mut Frame, area: Rect) {
        let Some(detail) = &self.detail else { return };
        let view = detail.metrics.view.as_ref();

        let cells = Layout::horizontal([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

        for (idx, name) in GAUGE_METRICS.iter().enumerate() {
            let gauge_value = view.and_then(|v| v.gauge(name));

            match gauge_value {
                Some(value) => {
                    let gauge = Gauge::default()
                        .block(Block::default().title(*name).title_style(theme::key_hint()))
                        .gauge_style(Style::default().fg(if value >= 90.0 {
                            theme::danger()
                        } else if value >= 75.0 {
                            theme::warning()
                        } else {
                            theme::success()
                        }))
                        .ratio(gauge_ratio(value))
                        .label(format_metric_value(name, value));
                    frame.render_widget(gauge, cells[idx]);
                }
                None => {
                    frame.render_widget(
                        Paragraph::new(format!("{name}\n--")).style(theme::key_hint()),
                        cells[idx],
                    );
                }
            }
        }
    }

    fn render_chart(&self, frame: &mut Frame, area: Rect) {
        let Some(detail) = &self.detail else { return };
        let panel = &detail.metrics;

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());

        let series: Vec<(f64, f64)> = panel
            .view
            .as_ref()
            .map(|v| {
                v.series
                    .iter()
                    .map(|p| (p.recorded_at.timestamp() as f64, p.value))
                    .collect()
            })
            .unwrap_or_default();

        if series.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            frame.render_widget(
                Paragraph::new("  no data").style(theme::key_hint()),
                inner,
            );
            return;
        }

        let x_min = series.first().map_or(0.0, |&(x, _)| x);
        let x_max = series.last().map_or(1.0, |&(x, _)| x);
        let y_max_raw = series.iter().map(|&(_, y)| y).fold(0.0_f64, f64::max);
        let y_max = if panel.metric_name().ends_with("_percent") {
            100.0
        } else {
            (y_max_raw * 1.2).max(1.0)
        };

        let metric_name = panel.metric_name();
        let first_ts = panel.view.as_ref().and_then(|v| v.series.first()).map(|p| p.recorded_at);
        let last_ts = panel.view.as_ref().and_then(|v| v.series.last()).map(|p| p.recorded_at);

        let x_labels = [first_ts, last_ts]
            .into_iter()
            .flatten()
            .map(|ts| {
                Span::styled(
                    format_x_label(ts, panel.range),
                    Style::default().fg(theme::dim()),
                )
            })
            .collect::<Vec<_>>();

        let y_labels = vec![
            Span::styled(
                format_metric_value(metric_name, 0.0),
                Style::default().fg(theme::dim()),
            ),
            Span::styled(
                format_metric_value(metric_name, y_max / 2.0),
                Style::default().fg(theme::dim()),
            ),
            Span::styled(
                format_metric_value(metric_name, y_max),
                Style::default().fg(theme::dim()),
            ),
        ];

        let dataset = Dataset::default()
            .name(metric_name)
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(theme::accent()))
            .data(&series);

        let chart = Chart::new(vec![dataset])
            .block(block)
            .x_axis(
                Axis::default()
                    .bounds([x_min, x_max])
                    .labels(x_labels)
                    .style(Style::default().fg(theme::border())),
            )
            .y_axis(
                Axis::default()
                    .bounds([0.0, y_max])
                    .labels(y_labels)
                    .style(Style::default().fg(theme::border())),
            );

        frame.render_widget(chart, area);
    }

    fn render_docker_form(&self, frame: &mut Frame, area: Rect) {
        let Some(form) = &self.docker_form else { return };
        let busy = self.detail.as_ref().is_some_and(|d| d.docker_busy);

        let width = 56u16.min(area.width.saturating_sub(4));
        let height = 10u16;
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let popup = Rect::new(x, y, width, height);

        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(" Set Up Docker ")
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
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

        let mode_style = |selected: bool| {
            if selected {
                Style::default()
                    .fg(theme::bg())
                    .bg(theme::accent())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme::dim())
            }
        };
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("  Connection  ", if form.cursor.index == 0 {
                    Style::default().fg(theme::accent())
                } else {
                    Style::default().fg(theme::dim())
                }),
                Span::styled(
                    " socket ",
                    mode_style(form.connection_type == DockerConnectionType::Socket),
                ),
                Span::raw(" "),
                Span::styled(
                    " tcp ",
                    mode_style(form.connection_type == DockerConnectionType::Tcp),
                ),
            ])),
            rows[0],
        );

        form.socket_path.render(frame, rows[1], form.cursor.index == 1);
        form.tcp_url.render(frame, rows[2], form.cursor.index == 2);

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("  Stats       ", if form.cursor.index == 3 {
                    Style::default().fg(theme::accent())
                } else {
                    Style::default().fg(theme::dim())
                }),
                Span::styled(
                    if form.collect_stats { "[x] collect" } else { "[ ] collect" },
                    Style::default().fg(theme::text()),
                ),
            ])),
            rows[3],
        );

        if let Some(error) = &form.error {
            frame.render_widget(
                Paragraph::new(format!("  {error}")).style(Style::default().fg(theme::danger())),
                rows[4],
            );
        }

        let hint = if busy {
            "  connecting…"
        } else {
            "  ←/→ mode · Space toggle · Enter submit · Esc cancel"
        };
        frame.render_widget(Paragraph::new(hint).style(theme::key_hint()), rows[5]);
    }

    fn render_service_form(&self, frame: &mut Frame, area: Rect) {
        let Some(form) = &self.service_form else { return };

        let width = 52u16.min(area.width.saturating_sub(4));
        let height = 9u16;
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let popup = Rect::new(x, y, width, height);

        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(" Add Service ")
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
        form.url.render(frame, rows[1], form.cursor.index == 1);
        form.service_type.render(frame, rows[2], form.cursor.index == 2);

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

impl Component for HostsScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        self.reload_list();
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.detail.is_some() {
            return Ok(self.handle_detail_key(key));
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if !self.hosts.is_empty() {
                    self.cursor = (self.cursor + 1).min(self.hosts.len() - 1);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Enter => {
                if let Some(host) = self.hosts.get(self.cursor) {
                    let id = host.id;
                    self.open_detail(id);
                }
            }
            KeyCode::Char('x') => {
                if let Some(host) = self.hosts.get(self.cursor) {
                    return Ok(Some(Action::ShowConfirm(ConfirmAction::DeleteHost {
                        id: host.id,
                        name: host.name.clone(),
                    })));
                }
            }
            KeyCode::Char('r') => self.reload_list(),
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::Tick => {
                self.expire_notice();
                if self.detail.as_ref().is_some_and(|d| d.sync_busy) {
                    self.throbber.get_mut().calc_next();
                }
            }

            Action::HostsLoaded { token, hosts } => {
                if *token == self.list_generation {
                    self.hosts = hosts.clone();
                    self.cursor = self.cursor.min(self.hosts.len().saturating_sub(1));
                }
            }

            Action::HostLoaded { token, host } => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.apply_host(*token, host.clone());
                }
            }

            Action::HostDeleted(_) => {
                self.notice = Some((
                    Notice::success("Host deleted", std::time::Duration::from_secs(5)),
                    Instant::now(),
                ));
                self.reload_list();
            }

            Action::HardwareDetected(host) => {
                // The scan replaced the hardware record server-side; show
                // the fresh host if its detail view is open.
                if let Some(detail) = self.detail.as_mut() {
                    if detail.host.as_ref().is_some_and(|h| h.id == host.id) {
                        let token = detail.begin_reload();
                        detail.apply_host(token, host.clone());
                    }
                }
            }

            Action::DockerSetupDone(outcome) => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.docker_setup_completed(outcome);
                    self.docker_form = None;
                    self.take_controller_notice();
                    // Refresh the host record regardless of outcome.
                    self.refresh_detail();
                }
            }

            Action::DockerSetupFailed(err) => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.docker_setup_failed(err);
                    self.docker_form = None;
                    self.take_controller_notice();
                }
            }

            Action::ContainerSyncDone(result) => {
                if let Some(detail) = self.detail.as_mut() {
                    let reload = detail.sync_completed(result.clone());
                    self.take_controller_notice();
                    if reload {
                        self.refresh_detail();
                    }
                }
            }

            Action::ServiceAdded(_) => {
                self.service_form = None;
                self.refresh_detail();
            }

            Action::MetricsLoaded { token, view } => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.metrics.apply(*token, view.clone());
                }
            }

            Action::ActionFailed(err) if self.focused => {
                if let Some(form) = self.service_form.as_mut() {
                    form.busy = false;
                    form.error = Some(err.to_string());
                } else {
                    self.notice = Some((
                        Notice::error(err.to_string(), std::time::Duration::from_secs(6)),
                        Instant::now(),
                    ));
                }
            }

            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        if self.detail.is_some() {
            self.render_detail(frame, area);
        } else {
            self.render_list(frame, area);
        }
    }

    fn wants_input(&self) -> bool {
        self.detail.is_some() || self.docker_form.is_some() || self.service_form.is_some()
    }

    fn focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "Hosts"
    }
}
