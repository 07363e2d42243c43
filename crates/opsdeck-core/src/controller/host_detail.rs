// ── Host detail controller ──
//
// Tabbed view over a single host: overview (hardware + Docker setup),
// containers (sync), services (inline add), metrics (query engine).

use std::time::Duration;

use opsdeck_api::types::{ContainerSyncResult, DockerSetupOutcome, Host, NewService};

use super::Notice;
use crate::error::CoreError;
use crate::metrics::{MetricsRange, MetricsView};

/// Metrics offered by the selector, gauges first.
pub const METRIC_CHOICES: [&str; 6] = [
    "cpu_percent",
    "ram_percent",
    "disk_percent",
    "net_rx_bytes",
    "net_tx_bytes",
    "load_avg_1m",
];

const SYNC_SUCCESS_TTL: Duration = Duration::from_secs(4);
const SYNC_FAILURE_TTL: Duration = Duration::from_secs(5);
const DOCKER_SETUP_TTL: Duration = Duration::from_secs(6);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostTab {
    #[default]
    Overview,
    Containers,
    Services,
    Metrics,
}

impl HostTab {
    pub const ALL: [HostTab; 4] = [
        Self::Overview,
        Self::Containers,
        Self::Services,
        Self::Metrics,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Containers => "Containers",
            Self::Services => "Services",
            Self::Metrics => "Metrics",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&t| t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|&t| t == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

// ── Metrics panel ────────────────────────────────────────────────────

/// Parameter + result state for the metrics tab. Every parameter change
/// replaces the generation token, so a fetch resolving after the user
/// moved on is discarded.
#[derive(Debug, Default)]
pub struct MetricsPanel {
    pub range: MetricsRange,
    pub metric: usize,
    pub view: Option<MetricsView>,
    generation: u64,
}

impl MetricsPanel {
    pub fn metric_name(&self) -> &'static str {
        METRIC_CHOICES[self.metric % METRIC_CHOICES.len()]
    }

    /// Start a fetch; the returned token must accompany the result.
    pub fn begin_fetch(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Apply a fetch result. Stale tokens leave the panel untouched.
    pub fn apply(&mut self, token: u64, view: MetricsView) -> bool {
        if token != self.generation {
            return false;
        }
        self.view = Some(view);
        true
    }

    /// Select the next range. Returns a fresh fetch token.
    pub fn cycle_range(&mut self) -> u64 {
        self.range = self.range.next();
        self.view = None;
        self.begin_fetch()
    }

    /// Select the next metric. Returns a fresh fetch token.
    pub fn cycle_metric(&mut self) -> u64 {
        self.metric = (self.metric + 1) % METRIC_CHOICES.len();
        self.view = None;
        self.begin_fetch()
    }
}

// ── Controller ───────────────────────────────────────────────────────

/// State of the host detail view.
pub struct HostDetailController {
    pub host: Option<Host>,
    pub tab: HostTab,
    pub notice: Option<Notice>,
    /// Busy flag for the inline Docker setup form (serializes submits).
    pub docker_busy: bool,
    /// Busy flag for the container sync action.
    pub sync_busy: bool,
    pub metrics: MetricsPanel,
    generation: u64,
}

impl Default for HostDetailController {
    fn default() -> Self {
        Self::new()
    }
}

impl HostDetailController {
    pub fn new() -> Self {
        Self {
            host: None,
            tab: HostTab::Overview,
            notice: None,
            docker_busy: false,
            sync_busy: false,
            metrics: MetricsPanel::default(),
            generation: 0,
        }
    }

    pub fn begin_reload(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn apply_host(&mut self, token: u64, host: Host) -> bool {
        if token != self.generation {
            return false;
        }
        self.host = Some(host);
        true
    }

    /// Switch tabs. Returns a metrics fetch token when the metrics tab
    /// was just activated — fetching only happens while it is active.
    pub fn set_tab(&mut self, tab: HostTab) -> Option<u64> {
        let was = self.tab;
        self.tab = tab;
        (tab == HostTab::Metrics && was != HostTab::Metrics).then(|| self.metrics.begin_fetch())
    }

    /// Docker setup finished: idle again, outcome becomes the notice.
    /// The host record is refreshed by the caller regardless of outcome.
    pub fn docker_setup_completed(&mut self, outcome: &DockerSetupOutcome) {
        self.docker_busy = false;
        self.notice = Some(docker_setup_notice(outcome));
    }

    /// Docker setup request never reached a result (transport error).
    pub fn docker_setup_failed(&mut self, err: &CoreError) {
        self.docker_busy = false;
        self.notice = Some(Notice::error(
            format!("Docker setup failed: {err}"),
            DOCKER_SETUP_TTL,
        ));
    }

    /// Container sync finished. Success reloads the host (caller's job)
    /// and clears after 4s; failure sticks for 5s.
    pub fn sync_completed(&mut self, result: Result<ContainerSyncResult, CoreError>) -> bool {
        self.sync_busy = false;
        match result {
            Ok(sync) => {
                self.notice = Some(Notice::success(
                    format!("Sync complete — {} containers discovered", sync.containers_found),
                    SYNC_SUCCESS_TTL,
                ));
                true
            }
            Err(err) => {
                self.notice = Some(Notice::error(
                    format!("Container sync failed: {err}"),
                    SYNC_FAILURE_TTL,
                ));
                false
            }
        }
    }

    /// Validate the inline add-service form and bind it to this host.
    pub fn new_service(&self, name: &str, url: &str, service_type: &str) -> Result<NewService, CoreError> {
        let host = self
            .host
            .as_ref()
            .ok_or_else(|| CoreError::Internal("no host loaded".into()))?;

        if name.trim().is_empty() {
            return Err(CoreError::validation("service name is required"));
        }
        if url.trim().is_empty() {
            return Err(CoreError::validation("service URL is required"));
        }

        Ok(NewService {
            host_id: Some(host.id),
            name: name.trim().to_owned(),
            url: url.trim().to_owned(),
            service_type: if service_type.trim().is_empty() {
                "http".into()
            } else {
                service_type.trim().to_owned()
            },
            ..NewService::default()
        })
    }
}

fn docker_setup_notice(outcome: &DockerSetupOutcome) -> Notice {
    if outcome.connection_ok {
        match &outcome.sync_result {
            Some(sync) => Notice::success(
                format!(
                    "Docker connected — {} containers synced",
                    sync.containers_found
                ),
                DOCKER_SETUP_TTL,
            ),
            None => Notice::info("Docker connected — no container data yet", DOCKER_SETUP_TTL),
        }
    } else {
        let reason = outcome.error.as_deref().unwrap_or("connection failed");
        Notice::warning(format!("Docker setup failed: {reason}"), DOCKER_SETUP_TTL)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use opsdeck_api::types::{HostStatus, HostType};

    use super::*;
    use crate::controller::NoticeLevel;

    fn host(id: i64) -> Host {
        Host {
            id,
            name: "atlas".into(),
            host_type: HostType::Server,
            ip: None,
            mac: None,
            os_name: None,
            os_version: None,
            hostname: None,
            location: None,
            status: HostStatus::Online,
            hardware: None,
            has_docker_integration: false,
            last_seen_at: None,
            containers: Vec::new(),
            services: Vec::new(),
        }
    }

    #[test]
    fn metrics_fetch_only_on_tab_activation() {
        let mut ctrl = HostDetailController::new();

        assert!(ctrl.set_tab(HostTab::Containers).is_none());
        assert!(ctrl.set_tab(HostTab::Metrics).is_some());
        // Already active — switching to itself must not refetch.
        assert!(ctrl.set_tab(HostTab::Metrics).is_none());
        assert!(ctrl.set_tab(HostTab::Overview).is_none());
    }

    #[test]
    fn stale_metrics_result_is_discarded() {
        let mut panel = MetricsPanel::default();

        let older = panel.begin_fetch();
        let newer = panel.cycle_range();

        assert!(!panel.apply(older, MetricsView::default()));
        assert!(panel.view.is_none());

        assert!(panel.apply(newer, MetricsView::default()));
        assert!(panel.view.is_some());
    }

    #[test]
    fn cycling_metric_clears_the_old_chart() {
        let mut panel = MetricsPanel::default();
        let token = panel.begin_fetch();
        panel.apply(token, MetricsView::default());
        assert!(panel.view.is_some());

        let name_before = panel.metric_name();
        panel.cycle_metric();
        assert!(panel.view.is_none());
        assert_ne!(panel.metric_name(), name_before);
    }

    #[test]
    fn docker_setup_outcomes_map_to_three_notices() {
        let mut ctrl = HostDetailController::new();

        ctrl.docker_busy = true;
        ctrl.docker_setup_completed(&DockerSetupOutcome {
            connection_ok: true,
            sync_result: Some(ContainerSyncResult {
                containers_found: 3,
            }),
            error: None,
        });
        assert!(!ctrl.docker_busy);
        let notice = ctrl.notice.clone().unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
        assert!(notice.message.contains("3 containers"));

        ctrl.docker_setup_completed(&DockerSetupOutcome {
            connection_ok: true,
            sync_result: None,
            error: None,
        });
        assert_eq!(ctrl.notice.clone().unwrap().level, NoticeLevel::Info);

        ctrl.docker_setup_completed(&DockerSetupOutcome {
            connection_ok: false,
            sync_result: None,
            error: Some("dial timeout".into()),
        });
        let notice = ctrl.notice.clone().unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert!(notice.message.contains("dial timeout"));
        assert_eq!(notice.ttl, Duration::from_secs(6));
    }

    #[test]
    fn sync_feedback_ttls_differ_by_outcome() {
        let mut ctrl = HostDetailController::new();

        ctrl.sync_busy = true;
        let reload = ctrl.sync_completed(Ok(ContainerSyncResult {
            containers_found: 9,
        }));
        assert!(reload);
        assert!(!ctrl.sync_busy);
        let notice = ctrl.notice.clone().unwrap();
        assert!(notice.message.contains("9 containers"));
        assert_eq!(notice.ttl, Duration::from_secs(4));

        let reload = ctrl.sync_completed(Err(CoreError::Transport {
            message: "connection refused".into(),
        }));
        assert!(!reload);
        assert_eq!(ctrl.notice.clone().unwrap().ttl, Duration::from_secs(5));
    }

    #[test]
    fn new_service_binds_host_id_and_validates() {
        let mut ctrl = HostDetailController::new();
        let token = ctrl.begin_reload();
        ctrl.apply_host(token, host(5));

        let svc = ctrl.new_service("grafana", "http://10.0.0.5:3000", "").unwrap();
        assert_eq!(svc.host_id, Some(5));
        assert_eq!(svc.service_type, "http");
        assert!(svc.is_monitored);

        let err = ctrl.new_service("", "http://x", "http").unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn stale_host_reload_is_discarded() {
        let mut ctrl = HostDetailController::new();

        let older = ctrl.begin_reload();
        let newer = ctrl.begin_reload();

        assert!(ctrl.apply_host(newer, host(2)));
        assert!(!ctrl.apply_host(older, host(1)));
        assert_eq!(ctrl.host.as_ref().unwrap().id, 2);
    }
}
