// ── Infrastructure dashboard controller ──
//
// Composes four independent snapshots (summary, hosts, containers,
// services) into the landing view, with a LIVE auto-refresh mode.

use std::time::Duration;

use opsdeck_api::HubClient;
use opsdeck_api::types::{
    Container, DashboardSummary, DockerSetupOutcome, Host, HostCreateResponse, Service,
};

use super::{Notice, NoticeLevel};
use crate::error::CoreError;

/// How long host-creation feedback stays on screen.
const CREATE_FEEDBACK_TTL: Duration = Duration::from_secs(8);

/// Result of one dashboard load pass. Each slot settles independently so
/// a single failure never blanks the other panels.
#[derive(Debug, Clone, Default)]
pub struct DashboardLoad {
    pub summary: Option<DashboardSummary>,
    pub hosts: Option<Vec<Host>>,
    pub containers: Option<Vec<Container>>,
    pub services: Option<Vec<Service>>,
    /// First failure seen, surfaced as the top-level error.
    pub error: Option<CoreError>,
}

impl DashboardLoad {
    /// Issue all four requests concurrently; wait for all to settle.
    pub async fn fetch(client: &HubClient) -> Self {
        let (summary, hosts, containers, services) = tokio::join!(
            client.dashboard(),
            client.list_hosts(),
            client.list_containers(),
            client.list_services(),
        );

        let mut load = Self::default();

        match summary {
            Ok(s) => load.summary = Some(s),
            Err(e) => load.record_error(e.into()),
        }
        match hosts {
            Ok(h) => load.hosts = Some(h),
            Err(e) => load.record_error(e.into()),
        }
        match containers {
            Ok(c) => load.containers = Some(c),
            Err(e) => load.record_error(e.into()),
        }
        match services {
            Ok(s) => load.services = Some(s),
            Err(e) => load.record_error(e.into()),
        }

        load
    }

    fn record_error(&mut self, err: CoreError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

/// State of the infrastructure landing view.
pub struct DashboardController {
    pub summary: Option<DashboardSummary>,
    pub hosts: Vec<Host>,
    pub containers: Vec<Container>,
    pub services: Vec<Service>,
    /// True until the first load settles.
    pub loading: bool,
    /// Top-level error from the most recent load, if any request failed.
    pub error: Option<String>,
    /// LIVE mode — drives the 30s poller and the pulse animation.
    pub auto_refresh: bool,
    generation: u64,
}

impl Default for DashboardController {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardController {
    pub fn new() -> Self {
        Self {
            summary: None,
            hosts: Vec::new(),
            containers: Vec::new(),
            services: Vec::new(),
            loading: true,
            error: None,
            auto_refresh: false,
            generation: 0,
        }
    }

    /// Begin a reload; returns the token the eventual result must carry.
    /// A newer reload supersedes an older one.
    pub fn begin_reload(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Apply a settled load. Returns `false` (untouched state) when the
    /// token is stale — an older reload resolving after a newer one.
    pub fn apply_load(&mut self, token: u64, load: DashboardLoad) -> bool {
        if token != self.generation {
            return false;
        }

        self.loading = false;
        self.error = load.error.map(|e| e.to_string());

        // A failed slot keeps its previous data on screen.
        if let Some(summary) = load.summary {
            self.summary = Some(summary);
        }
        if let Some(hosts) = load.hosts {
            self.hosts = hosts;
        }
        if let Some(containers) = load.containers {
            self.containers = containers;
        }
        if let Some(services) = load.services {
            self.services = services;
        }

        true
    }

    /// Toggle LIVE mode. The caller starts/stops the poller accordingly.
    pub fn toggle_auto_refresh(&mut self) -> bool {
        self.auto_refresh = !self.auto_refresh;
        self.auto_refresh
    }

    /// The LIVE badge is visible iff auto-refresh is on; status dots
    /// pulse only then.
    pub fn live(&self) -> bool {
        self.auto_refresh
    }

    /// Feedback for a completed host creation. When the form carried
    /// Docker setup fields the response reports the setup outcome with
    /// three cases; otherwise it's a plain success.
    pub fn host_created(response: &HostCreateResponse) -> Notice {
        match &response.docker_setup {
            Some(outcome) => docker_setup_notice(&response.host.name, outcome),
            None => Notice::success(
                format!("Host \"{}\" created", response.host.name),
                CREATE_FEEDBACK_TTL,
            ),
        }
    }
}

fn docker_setup_notice(host_name: &str, outcome: &DockerSetupOutcome) -> Notice {
    if outcome.connection_ok {
        match &outcome.sync_result {
            Some(sync) => Notice::success(
                format!(
                    "Host \"{host_name}\" created — Docker connected, {} containers synced",
                    sync.containers_found
                ),
                CREATE_FEEDBACK_TTL,
            ),
            None => Notice::info(
                format!("Host \"{host_name}\" created — Docker connected, no container data yet"),
                CREATE_FEEDBACK_TTL,
            ),
        }
    } else {
        let reason = outcome.error.as_deref().unwrap_or("connection failed");
        Notice {
            message: format!("Host \"{host_name}\" created, but Docker setup failed: {reason}"),
            level: NoticeLevel::Warning,
            ttl: CREATE_FEEDBACK_TTL,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use opsdeck_api::types::{ContainerSyncResult, HostStatus, HostType};

    use super::*;

    fn host(id: i64, name: &str) -> Host {
        Host {
            id,
            name: name.into(),
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

    fn create_response(docker_setup: Option<DockerSetupOutcome>) -> HostCreateResponse {
        HostCreateResponse {
            host: host(1, "atlas"),
            docker_setup,
        }
    }

    #[test]
    fn stale_load_is_discarded() {
        let mut ctrl = DashboardController::new();

        let older = ctrl.begin_reload();
        let newer = ctrl.begin_reload();

        let mut newer_load = DashboardLoad::default();
        newer_load.hosts = Some(vec![host(1, "atlas"), host(2, "borei")]);
        assert!(ctrl.apply_load(newer, newer_load));

        // The older request resolves last — its result must be dropped.
        let mut older_load = DashboardLoad::default();
        older_load.hosts = Some(vec![host(3, "stale")]);
        assert!(!ctrl.apply_load(older, older_load));

        assert_eq!(ctrl.hosts.len(), 2);
        assert_eq!(ctrl.hosts[0].name, "atlas");
    }

    #[test]
    fn partial_failure_keeps_other_panels() {
        let mut ctrl = DashboardController::new();
        let token = ctrl.begin_reload();

        let mut load = DashboardLoad::default();
        load.hosts = Some(vec![host(1, "atlas")]);
        load.error = Some(CoreError::ServerFailure {
            status: 500,
            message: "summary exploded".into(),
        });

        assert!(ctrl.apply_load(token, load));
        assert!(!ctrl.loading);
        assert_eq!(ctrl.hosts.len(), 1);
        assert!(ctrl.error.as_ref().unwrap().contains("summary exploded"));
    }

    #[test]
    fn live_indicator_follows_auto_refresh() {
        let mut ctrl = DashboardController::new();
        assert!(!ctrl.live());

        assert!(ctrl.toggle_auto_refresh());
        assert!(ctrl.live());

        assert!(!ctrl.toggle_auto_refresh());
        assert!(!ctrl.live());
    }

    #[test]
    fn host_created_with_sync_reports_count() {
        let notice = DashboardController::host_created(&create_response(Some(DockerSetupOutcome {
            connection_ok: true,
            sync_result: Some(ContainerSyncResult {
                containers_found: 7,
            }),
            error: None,
        })));

        assert_eq!(notice.level, NoticeLevel::Success);
        assert!(notice.message.contains("7 containers"));
        assert_eq!(notice.ttl, Duration::from_secs(8));
    }

    #[test]
    fn host_created_connected_without_data() {
        let notice = DashboardController::host_created(&create_response(Some(DockerSetupOutcome {
            connection_ok: true,
            sync_result: None,
            error: None,
        })));

        assert_eq!(notice.level, NoticeLevel::Info);
        assert!(notice.message.contains("no container data"));
    }

    #[test]
    fn host_created_setup_failure_is_warning_host_still_saved() {
        let notice = DashboardController::host_created(&create_response(Some(DockerSetupOutcome {
            connection_ok: false,
            sync_result: None,
            error: Some("dial timeout".into()),
        })));

        assert_eq!(notice.level, NoticeLevel::Warning);
        assert!(notice.message.contains("created"));
        assert!(notice.message.contains("dial timeout"));
    }

    #[test]
    fn host_created_without_docker_fields_is_plain_success() {
        let notice = DashboardController::host_created(&create_response(None));
        assert_eq!(notice.level, NoticeLevel::Success);
    }
}
