//! All possible UI actions. Actions are the sole mechanism for state
//! mutation: key handlers and background tasks dispatch them, the app loop
//! routes them, screens fold them into controller state.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use opsdeck_api::StreamEvent;
use opsdeck_core::model::{
    BulkImportRequest, BulkImportResult, BulkResult, ContainerSyncResult, ControlAction,
    DeviceBulkUpdate, DiscoveredEntity, DockerSetupOutcome, DockerSetupRequest, Host,
    HostCreateResponse, Incident, IncidentPatch, NetworkDevice, NewHost, NewIncident, NewService,
    Room, Service, SmartHomeDashboard,
};
use opsdeck_core::{CoreError, DashboardLoad, IncidentFilter, MetricsRange, MetricsView};

use crate::screen::ScreenId;

/// Pending confirmation for a destructive action.
#[derive(Debug, Clone)]
pub enum ConfirmAction {
    DeleteHost { id: i64, name: String },
    DeleteIncident { id: i64, title: String },
    BulkDeleteDevices { ids: Vec<i64>, prompt: String },
}

impl fmt::Display for ConfirmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeleteHost { name, .. } => {
                write!(f, "Delete host {name}? This cannot be undone.")
            }
            Self::DeleteIncident { title, .. } => write!(f, "Delete incident \"{title}\"?"),
            Self::BulkDeleteDevices { prompt, .. } => f.write_str(prompt),
        }
    }
}

/// Every state transition in the console is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ────────────────────────────────────────────────
    SwitchScreen(ScreenId),
    GoBack,
    ToggleHelp,
    CycleTheme,

    // ── Poll triggers (visibility-gated background schedules) ─────
    PollDashboard,
    PollSmartHome,

    // ── Event stream ──────────────────────────────────────────────
    StreamEvent(Arc<StreamEvent>),

    // ── Dashboard ─────────────────────────────────────────────────
    FetchDashboard { token: u64 },
    DashboardLoaded { token: u64, load: DashboardLoad },
    SetAutoRefresh(bool),
    CreateHost(NewHost),
    HostCreated(HostCreateResponse),
    HostCreateFailed(CoreError),

    // ── Hosts / host detail ───────────────────────────────────────
    FetchHosts { token: u64 },
    HostsLoaded { token: u64, hosts: Vec<Host> },
    FetchHost { token: u64, id: i64 },
    HostLoaded { token: u64, host: Host },
    DeleteHost(i64),
    HostDeleted(i64),
    DetectHardware(i64),
    HardwareDetected(Host),
    RequestDockerSetup { host_id: i64, request: DockerSetupRequest },
    DockerSetupDone(DockerSetupOutcome),
    DockerSetupFailed(CoreError),
    RequestContainerSync(i64),
    ContainerSyncDone(Result<ContainerSyncResult, CoreError>),
    AddService(NewService),
    ServiceAdded(Service),
    FetchMetrics {
        token: u64,
        source_id: i64,
        metric: String,
        range: MetricsRange,
    },
    MetricsLoaded { token: u64, view: MetricsView },

    // ── Smart home ────────────────────────────────────────────────
    FetchSmartHome { token: u64 },
    SmartHomeLoaded {
        token: u64,
        dashboard: SmartHomeDashboard,
    },
    RoomsLoaded(Vec<Room>),
    ControlDevice { id: i64, action: ControlAction },
    FavoriteDevice(i64),
    BulkUpdateDevices(DeviceBulkUpdate),
    BulkDeleteDevices(Vec<i64>),
    BulkCompleted(BulkResult),
    FetchDiscovery,
    DiscoveryLoaded(BTreeMap<String, Vec<DiscoveredEntity>>),
    BulkImport(BulkImportRequest),
    ImportCompleted(BulkImportResult),

    // ── Incidents ─────────────────────────────────────────────────
    FetchIncidents { token: u64, filter: IncidentFilter },
    IncidentsLoaded { token: u64, incidents: Vec<Incident> },
    CreateIncident(NewIncident),
    IncidentCreated(Incident),
    ResolveIncident { id: i64, patch: IncidentPatch },
    IncidentUpdated(Incident),
    DeleteIncident(i64),
    IncidentDeleted(i64),

    // ── Network devices ───────────────────────────────────────────
    FetchNetwork { token: u64 },
    NetworkLoaded {
        token: u64,
        devices: Vec<NetworkDevice>,
    },

    // ── Confirm dialog ────────────────────────────────────────────
    ShowConfirm(ConfirmAction),
    ConfirmYes,
    ConfirmNo,

    // ── Feedback ──────────────────────────────────────────────────
    /// A user-initiated request failed. Background-refresh failures are
    /// swallowed by the spawning task and never become actions.
    ActionFailed(CoreError),
}
