//! Application core — event loop, screen management, action dispatch,
//! background schedules.
//!
//! Screens never talk to the backend directly: they dispatch request
//! actions, the app spawns the IO task, and the result comes back as
//! another action. The visibility watch channel (fed by terminal focus
//! events) gates every poller; the SSE subscription stays open while
//! hidden — consumers tolerate the burst on refocus.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs},
};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use opsdeck_api::{HubClient, ReconnectConfig, SseHandle, TransportConfig};
use opsdeck_config::prefs::PrefsStore;
use opsdeck_core::metrics;
use opsdeck_core::{ConsoleConfig, DashboardLoad, Poller};

use crate::action::{Action, ConfirmAction};
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;

/// Top-level application state and event loop.
pub struct App {
    active_screen: ScreenId,
    previous_screen: Option<ScreenId>,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    help_visible: bool,
    pending_confirm: Option<ConfirmAction>,
    terminal_size: (u16, u16),
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,

    client: Arc<HubClient>,
    transport: TransportConfig,
    config: ConsoleConfig,
    prefs: PrefsStore,

    /// Visibility gate fed by terminal focus events; every poller
    /// subscribes.
    visibility_tx: watch::Sender<bool>,
    /// LIVE-mode dashboard schedule, present while auto-refresh is on.
    dashboard_poller: Option<Poller>,
    /// Always-on smart-home fallback schedule.
    smarthome_poller: Option<Poller>,
    sse: Option<SseHandle>,
    cancel: CancellationToken,
}

impl App {
    pub fn new(
        client: HubClient,
        transport: TransportConfig,
        config: ConsoleConfig,
        prefs: PrefsStore,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let (visibility_tx, _) = watch::channel(true);

        theme::set_active(theme::ThemeKind::from_name(&prefs.prefs().theme));

        let screens: HashMap<ScreenId, Box<dyn Component>> =
            create_screens().into_iter().collect();

        Self {
            active_screen: ScreenId::Dashboard,
            previous_screen: None,
            screens,
            running: true,
            help_visible: false,
            pending_confirm: None,
            terminal_size: (0, 0),
            action_tx,
            action_rx,
            client: Arc::new(client),
            transport,
            config,
            prefs,
            visibility_tx,
            dashboard_poller: None,
            smarthome_poller: None,
            sse: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Initialize all screen components with the action sender.
    fn init_screens(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
        Ok(())
    }

    /// Open the SSE subscription and the smart-home fallback schedule.
    fn start_background(&mut self) {
        if self.config.sse_enabled {
            // The stream client drops the request timeout: the response
            // body stays open for the lifetime of the subscription.
            match self.transport.streaming().build_client() {
                Ok(http) => {
                    let handle = SseHandle::connect(
                        self.client.stream_url(),
                        http,
                        ReconnectConfig::default(),
                        self.cancel.child_token(),
                    );

                    let mut rx = handle.subscribe();
                    let tx = self.action_tx.clone();
                    let cancel = self.cancel.clone();
                    tokio::spawn(async move {
                        loop {
                            tokio::select! {
                                biased;
                                _ = cancel.cancelled() => break,
                                event = rx.recv() => match event {
                                    Ok(event) => {
                                        let _ = tx.send(Action::StreamEvent(event));
                                    }
                                    // Lagged consumers just miss events;
                                    // the fallback poll repairs state.
                                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                                },
                            }
                        }
                    });

                    self.sse = Some(handle);
                }
                Err(e) => warn!(error = %e, "could not build SSE client"),
            }
        }

        let tx = self.action_tx.clone();
        self.smarthome_poller = Some(Poller::start(
            Duration::from_secs(self.config.smarthome_refresh_secs),
            self.visibility_tx.subscribe(),
            move || {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(Action::PollSmartHome);
                }
            },
        ));
    }

    /// Run the main event loop. This is the heart of the console.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.terminal_size = tui.size().unwrap_or((80, 24));
        self.init_screens()?;
        self.start_background();

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("console event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Mouse(mouse) => {
                    if let Some(action) = self.handle_mouse_event(mouse)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => {
                    self.action_tx.send(Action::Resize(w, h))?;
                }
                Event::Focus(visible) => {
                    // Pollers pause while hidden; the SSE stream stays up.
                    let _ = self.visibility_tx.send(visible);
                }
                Event::Tick => {
                    self.action_tx.send(Action::Tick)?;
                }
                Event::Render => {
                    self.action_tx.send(Action::Render)?;
                }
            }

            // Drain and process all queued actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        self.cancel.cancel();
        if let Some(poller) = self.dashboard_poller.take() {
            poller.stop();
        }
        if let Some(poller) = self.smarthome_poller.take() {
            poller.stop();
        }
        if let Some(sse) = &self.sse {
            sse.shutdown();
        }
        info!("console event loop ended");
        Ok(())
    }

    /// Map a key event to an action. Global keys are handled here;
    /// screen-specific keys are delegated to the active screen component.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        // Ctrl+C always quits, even inside forms.
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if self.pending_confirm.is_some() {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Enter => Ok(Some(Action::ConfirmYes)),
                KeyCode::Char('n') | KeyCode::Esc => Ok(Some(Action::ConfirmNo)),
                _ => Ok(None),
            };
        }

        if self.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Ok(Some(Action::ToggleHelp)),
                _ => Ok(None),
            };
        }

        // A screen with an open form/modal/detail captures everything.
        let captured = self
            .screens
            .get(&self.active_screen)
            .is_some_and(|s| s.wants_input());

        if !captured {
            match (key.modifiers, key.code) {
                (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
                (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
                (KeyModifiers::NONE, KeyCode::Char('t')) => return Ok(Some(Action::CycleTheme)),

                (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='5')) => {
                    let n = c as u8 - b'0';
                    if let Some(screen) = ScreenId::from_number(n) {
                        return Ok(Some(Action::SwitchScreen(screen)));
                    }
                }

                (KeyModifiers::NONE, KeyCode::Tab) => {
                    return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
                }
                (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                    return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
                }

                (KeyModifiers::NONE, KeyCode::Esc) => return Ok(Some(Action::GoBack)),

                _ => {}
            }
        }

        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_key_event(key);
        }

        Ok(None)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_mouse_event(mouse);
        }
        Ok(None)
    }

    /// Process a single action — update app state, spawn IO, propagate.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.running = false;
            }

            Action::Resize(w, h) => {
                self.terminal_size = (*w, *h);
            }

            Action::SwitchScreen(target) => {
                if *target != self.active_screen {
                    debug!("switching screen: {} → {}", self.active_screen, target);
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(false);
                    }
                    self.previous_screen = Some(self.active_screen);
                    self.active_screen = *target;
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(true);
                    }
                }
            }

            Action::GoBack => {
                if let Some(prev) = self.previous_screen.take() {
                    self.action_tx.send(Action::SwitchScreen(prev))?;
                }
            }

            Action::ToggleHelp => {
                self.help_visible = !self.help_visible;
            }

            Action::CycleTheme => {
                let kind = theme::active().toggled();
                theme::set_active(kind);
                if let Err(e) = self.prefs.set_theme(kind.name()) {
                    warn!(error = %e, "failed to persist theme");
                }
            }

            Action::SetAutoRefresh(on) => {
                if *on {
                    let tx = self.action_tx.clone();
                    self.dashboard_poller = Some(Poller::start(
                        Duration::from_secs(self.config.dashboard_refresh_secs),
                        self.visibility_tx.subscribe(),
                        move || {
                            let tx = tx.clone();
                            async move {
                                let _ = tx.send(Action::PollDashboard);
                            }
                        },
                    ));
                } else {
                    // Dropping the handle cancels the schedule.
                    self.dashboard_poller = None;
                }
            }

            Action::ShowConfirm(confirm) => {
                self.pending_confirm = Some(confirm.clone());
            }

            Action::ConfirmNo => {
                self.pending_confirm = None;
            }

            Action::ConfirmYes => {
                if let Some(confirm) = self.pending_confirm.take() {
                    match confirm {
                        ConfirmAction::DeleteHost { id, .. } => {
                            self.action_tx.send(Action::DeleteHost(id))?;
                        }
                        ConfirmAction::DeleteIncident { id, .. } => {
                            self.action_tx.send(Action::DeleteIncident(id))?;
                        }
                        ConfirmAction::BulkDeleteDevices { ids, .. } => {
                            self.action_tx.send(Action::BulkDeleteDevices(ids))?;
                        }
                    }
                }
            }

            // Render is handled in the main loop, not here
            Action::Render => {}

            other => {
                if !self.dispatch_io(other) {
                    // Data and lifecycle actions go to every screen —
                    // background results must land even when their
                    // screen is not the active one.
                    let mut follow_ups = Vec::new();
                    for screen in self.screens.values_mut() {
                        if let Some(follow_up) = screen.update(other)? {
                            follow_ups.push(follow_up);
                        }
                    }
                    for follow_up in follow_ups {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Spawn the IO task for a request action. Returns `false` when the
    /// action is not a request and should be routed to screens instead.
    #[allow(clippy::too_many_lines)]
    fn dispatch_io(&self, action: &Action) -> bool {
        let client = Arc::clone(&self.client);
        let tx = self.action_tx.clone();

        match action.clone() {
            Action::FetchDashboard { token } => {
                tokio::spawn(async move {
                    let load = DashboardLoad::fetch(&client).await;
                    let _ = tx.send(Action::DashboardLoaded { token, load });
                });
            }

            Action::CreateHost(new_host) => {
                tokio::spawn(async move {
                    match client.create_host(&new_host).await {
                        Ok(response) => {
                            let _ = tx.send(Action::HostCreated(response));
                        }
                        Err(e) => {
                            let _ = tx.send(Action::HostCreateFailed(e.into()));
                        }
                    }
                });
            }

            Action::FetchHosts { token } => {
                tokio::spawn(async move {
                    match client.list_hosts().await {
                        Ok(hosts) => {
                            let _ = tx.send(Action::HostsLoaded { token, hosts });
                        }
                        Err(e) => {
                            let _ = tx.send(Action::ActionFailed(e.into()));
                        }
                    }
                });
            }

            Action::FetchHost { token, id } => {
                tokio::spawn(async move {
                    match client.get_host(id).await {
                        Ok(host) => {
                            let _ = tx.send(Action::HostLoaded { token, host });
                        }
                        Err(e) => {
                            let _ = tx.send(Action::ActionFailed(e.into()));
                        }
                    }
                });
            }

            Action::DeleteHost(id) => {
                tokio::spawn(async move {
                    match client.delete_host(id).await {
                        Ok(()) => {
                            let _ = tx.send(Action::HostDeleted(id));
                        }
                        Err(e) => {
                            let _ = tx.send(Action::ActionFailed(e.into()));
                        }
                    }
                });
            }

            Action::DetectHardware(id) => {
                tokio::spawn(async move {
                    match client.detect_hardware(id).await {
                        Ok(host) => {
                            let _ = tx.send(Action::HardwareDetected(host));
                        }
                        Err(e) => {
                            let _ = tx.send(Action::ActionFailed(e.into()));
                        }
                    }
                });
            }

            Action::RequestDockerSetup { host_id, request } => {
                tokio::spawn(async move {
                    match client.setup_docker(host_id, &request).await {
                        Ok(outcome) => {
                            let _ = tx.send(Action::DockerSetupDone(outcome));
                        }
                        Err(e) => {
                            let _ = tx.send(Action::DockerSetupFailed(e.into()));
                        }
                    }
                });
            }

            Action::RequestContainerSync(host_id) => {
                tokio::spawn(async move {
                    let result = client
                        .sync_containers(host_id)
                        .await
                        .map_err(Into::into);
                    let _ = tx.send(Action::ContainerSyncDone(result));
                });
            }

            Action::AddService(new_service) => {
                tokio::spawn(async move {
                    match client.create_service(&new_service).await {
                        Ok(service) => {
                            let _ = tx.send(Action::ServiceAdded(service));
                        }
                        Err(e) => {
                            let _ = tx.send(Action::ActionFailed(e.into()));
                        }
                    }
                });
            }

            Action::FetchMetrics {
                token,
                source_id,
                metric,
                range,
            } => {
                tokio::spawn(async move {
                    let view = metrics::fetch_metrics(
                        &client,
                        opsdeck_core::model::SourceType::Host,
                        source_id,
                        &metric,
                        range,
                    )
                    .await;
                    let _ = tx.send(Action::MetricsLoaded { token, view });
                });
            }

            Action::FetchSmartHome { token } => {
                tokio::spawn(async move {
                    let (dashboard, rooms) =
                        tokio::join!(client.smarthome_dashboard(), client.list_rooms());

                    match dashboard {
                        Ok(dashboard) => {
                            let _ = tx.send(Action::SmartHomeLoaded { token, dashboard });
                        }
                        Err(e) => {
                            // Background refresh failures stay silent; the
                            // next tick retries.
                            let err: opsdeck_core::CoreError = e.into();
                            if err.is_silent_for_background() {
                                warn!(error = %err, "smart-home refresh failed");
                            } else {
                                let _ = tx.send(Action::ActionFailed(err));
                            }
                        }
                    }
                    if let Ok(rooms) = rooms {
                        let _ = tx.send(Action::RoomsLoaded(rooms));
                    }
                });
            }

            Action::ControlDevice { id, action } => {
                tokio::spawn(async move {
                    // No optimistic update: the next stream event or the
                    // fallback poll reflects the result.
                    if let Err(e) = client.control_device(id, action).await {
                        let _ = tx.send(Action::ActionFailed(e.into()));
                    }
                });
            }

            Action::FavoriteDevice(id) => {
                tokio::spawn(async move {
                    match client.favorite_device(id).await {
                        Ok(()) => {
                            let _ = tx.send(Action::PollSmartHome);
                        }
                        Err(e) => {
                            let _ = tx.send(Action::ActionFailed(e.into()));
                        }
                    }
                });
            }

            Action::BulkUpdateDevices(update) => {
                tokio::spawn(async move {
                    match client.bulk_update_devices(&update).await {
                        Ok(result) => {
                            let _ = tx.send(Action::BulkCompleted(result));
                        }
                        Err(e) => {
                            let _ = tx.send(Action::ActionFailed(e.into()));
                        }
                    }
                });
            }

            Action::BulkDeleteDevices(ids) => {
                tokio::spawn(async move {
                    match client.bulk_delete_devices(&ids).await {
                        Ok(result) => {
                            let _ = tx.send(Action::BulkCompleted(result));
                        }
                        Err(e) => {
                            let _ = tx.send(Action::ActionFailed(e.into()));
                        }
                    }
                });
            }

            Action::FetchDiscovery => {
                tokio::spawn(async move {
                    match client.discover_entities().await {
                        Ok(by_domain) => {
                            let _ = tx.send(Action::DiscoveryLoaded(by_domain));
                        }
                        Err(e) => {
                            let _ = tx.send(Action::ActionFailed(e.into()));
                        }
                    }
                });
            }

            Action::BulkImport(request) => {
                tokio::spawn(async move {
                    match client.bulk_import_devices(&request).await {
                        Ok(result) => {
                            let _ = tx.send(Action::ImportCompleted(result));
                        }
                        Err(e) => {
                            let _ = tx.send(Action::ActionFailed(e.into()));
                        }
                    }
                });
            }

            Action::FetchIncidents { token, filter } => {
                tokio::spawn(async move {
                    match client.list_incidents(filter.as_status()).await {
                        Ok(incidents) => {
                            let _ = tx.send(Action::IncidentsLoaded { token, incidents });
                        }
                        Err(e) => {
                            let _ = tx.send(Action::ActionFailed(e.into()));
                        }
                    }
                });
            }

            Action::CreateIncident(new_incident) => {
                tokio::spawn(async move {
                    match client.create_incident(&new_incident).await {
                        Ok(incident) => {
                            let _ = tx.send(Action::IncidentCreated(incident));
                        }
                        Err(e) => {
                            let _ = tx.send(Action::ActionFailed(e.into()));
                        }
                    }
                });
            }

            Action::ResolveIncident { id, patch } => {
                tokio::spawn(async move {
                    match client.update_incident(id, &patch).await {
                        Ok(incident) => {
                            let _ = tx.send(Action::IncidentUpdated(incident));
                        }
                        Err(e) => {
                            let _ = tx.send(Action::ActionFailed(e.into()));
                        }
                    }
                });
            }

            Action::DeleteIncident(id) => {
                tokio::spawn(async move {
                    match client.delete_incident(id).await {
                        Ok(()) => {
                            let _ = tx.send(Action::IncidentDeleted(id));
                        }
                        Err(e) => {
                            let _ = tx.send(Action::ActionFailed(e.into()));
                        }
                    }
                });
            }

            Action::FetchNetwork { token } => {
                tokio::spawn(async move {
                    match client.list_network_devices().await {
                        Ok(devices) => {
                            let _ = tx.send(Action::NetworkLoaded { token, devices });
                        }
                        Err(e) => {
                            let _ = tx.send(Action::ActionFailed(e.into()));
                        }
                    }
                });
            }

            _ => return false,
        }

        true
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::vertical([
            Constraint::Min(1),    // Screen content
            Constraint::Length(1), // Tab bar
            Constraint::Length(1), // Status bar
        ])
        .split(area);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, layout[0]);
        }

        self.render_tab_bar(frame, layout[1]);
        self.render_status_bar(frame, layout[2]);

        if let Some(confirm) = &self.pending_confirm {
            self.render_confirm(frame, area, confirm);
        }
        if self.help_visible {
            self.render_help_overlay(frame, area);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(
                    format!(" {} {} ", id.number(), id.label()),
                    style,
                ))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(
                ScreenId::ALL
                    .iter()
                    .position(|&s| s == self.active_screen)
                    .unwrap_or(0),
            );

        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let stream = if self.sse.is_some() {
            Span::styled("● stream", Style::default().fg(theme::success()))
        } else {
            Span::styled("○ no stream", Style::default().fg(theme::dim()))
        };

        let line = Line::from(vec![
            Span::raw(" "),
            stream,
            Span::styled(
                format!(" │ {} │ {}", self.config.url, theme::active().name()),
                theme::key_hint(),
            ),
            Span::styled("  ? help · t theme · q quit", theme::key_hint()),
        ]);

        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_confirm(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmAction) {
        let text = confirm.to_string();
        let width = (text.len() as u16 + 6).clamp(30, area.width.saturating_sub(4));
        let height = 5u16;
        let x = (area.width.saturating_sub(width)) / 2;
        let y = (area.height.saturating_sub(height)) / 2;
        let popup = Rect::new(area.x + x, area.y + y, width, height);

        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(" Confirm ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::danger()));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        frame.render_widget(
            Paragraph::new(vec![
                Line::from(Span::styled(
                    format!("  {text}"),
                    Style::default().fg(theme::text()),
                )),
                Line::from(""),
                Line::from(Span::styled("  y confirm · n cancel", theme::key_hint())),
            ]),
            inner,
        );
    }

    fn render_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let help_width = 58u16.min(area.width.saturating_sub(4));
        let help_height = 18u16.min(area.height.saturating_sub(4));

        let x = (area.width.saturating_sub(help_width)) / 2;
        let y = (area.height.saturating_sub(help_height)) / 2;
        let help_area = Rect::new(area.x + x, area.y + y, help_width, help_height);

        frame.render_widget(Clear, help_area);

        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());

        let inner = block.inner(help_area);
        frame.render_widget(block, help_area);

        let row = |key: &'static str, label: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {key:<10}"), theme::key_hint_key()),
                Span::styled(label, theme::key_hint()),
            ])
        };

        let help_text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "  Navigation",
                Style::default().fg(theme::accent()),
            )),
            row("1-5", "Jump to screen"),
            row("Tab", "Next screen"),
            row("j/k ↑/↓", "Move up/down"),
            row("Enter", "Select / open / control"),
            row("Esc", "Back / close"),
            Line::from(""),
            Line::from(Span::styled(
                "  Global",
                Style::default().fg(theme::accent()),
            )),
            row("t", "Switch theme"),
            row("?", "This help"),
            row("q", "Quit"),
            Line::from(""),
            Line::from(Span::styled(
                "                     Esc or ? to close",
                theme::key_hint(),
            )),
        ];

        frame.render_widget(Paragraph::new(help_text), inner);
    }
}
