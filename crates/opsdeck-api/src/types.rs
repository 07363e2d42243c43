//! Wire types for the infrastructure backend.
//!
//! All types match the JSON the backend speaks under `/api/infrastructure/`.
//! Field names are snake_case on the wire, so serde defaults apply. Entities
//! are plain value types — consumers hold snapshots, the server owns
//! identity.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Hosts ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostType {
    Server,
    Vm,
    Vps,
    RaspberryPi,
    Nas,
    Workstation,
    #[serde(other)]
    Other,
}

impl Default for HostType {
    fn default() -> Self {
        Self::Server
    }
}

impl HostType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Vm => "vm",
            Self::Vps => "vps",
            Self::RaspberryPi => "raspberry_pi",
            Self::Nas => "nas",
            Self::Workstation => "workstation",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostStatus {
    Online,
    Offline,
    Degraded,
    #[default]
    #[serde(other)]
    Unknown,
}

impl HostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Degraded => "degraded",
            Self::Unknown => "unknown",
        }
    }
}

/// Hardware record attached to a host, fully optional field-by-field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Hardware {
    pub cpu: Option<String>,
    pub cpu_cores: Option<u32>,
    pub cpu_threads: Option<u32>,
    pub ram_gb: Option<f64>,
    pub disk_gb: Option<f64>,
    pub gpu: Option<String>,
}

/// A monitored host. Detail fetches nest containers and services;
/// list fetches leave both empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub id: i64,
    pub name: String,
    pub host_type: HostType,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub os_name: Option<String>,
    #[serde(default)]
    pub os_version: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: HostStatus,
    #[serde(default)]
    pub hardware: Option<Hardware>,
    #[serde(default)]
    pub has_docker_integration: bool,
    #[serde(default)]
    pub last_seen_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(default)]
    pub services: Vec<Service>,
}

/// Body for `POST /hosts`. Docker setup fields ride along when the
/// creation form included them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewHost {
    pub name: String,
    pub host_type: HostType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_setup: Option<DockerSetupRequest>,
}


/// Partial update for `PATCH /hosts/:id`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_type: Option<HostType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Response of `POST /hosts` — the created host plus, when Docker setup
/// fields were submitted, the setup outcome.
#[derive(Debug, Clone, Deserialize)]
pub struct HostCreateResponse {
    #[serde(flatten)]
    pub host: Host,
    #[serde(default)]
    pub docker_setup: Option<DockerSetupOutcome>,
}

// ── Docker integration ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DockerConnectionType {
    Socket,
    Tcp,
}

/// Body for `POST /hosts/:id/setup-docker`.
#[derive(Debug, Clone, Serialize)]
pub struct DockerSetupRequest {
    pub connection_type: DockerConnectionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp_url: Option<String>,
    pub collect_stats: bool,
}

/// Result of a container sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSyncResult {
    pub containers_found: i64,
}

/// Outcome of a Docker setup attempt. `connection_ok` without a
/// `sync_result` means the daemon answered but returned no data yet.
#[derive(Debug, Clone, Deserialize)]
pub struct DockerSetupOutcome {
    pub connection_ok: bool,
    #[serde(default)]
    pub sync_result: Option<ContainerSyncResult>,
    #[serde(default)]
    pub error: Option<String>,
}

// ── Containers ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerStatus {
    Running,
    Exited,
    Restarting,
    Stopped,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ContainerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Exited => "exited",
            Self::Restarting => "restarting",
            Self::Stopped => "stopped",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub id: i64,
    pub host_id: i64,
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub status: ContainerStatus,
    /// Docker labels, carried verbatim.
    #[serde(default)]
    pub labels: Option<Value>,
    /// Port mappings, carried verbatim.
    #[serde(default)]
    pub ports: Option<Value>,
}

// ── Services ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Up,
    Down,
    Degraded,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ServiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Degraded => "degraded",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    #[serde(default)]
    pub host_id: Option<i64>,
    pub name: String,
    pub url: String,
    pub service_type: String,
    #[serde(default)]
    pub status: ServiceStatus,
    #[serde(default)]
    pub last_check_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_response_time_ms: Option<i64>,
    #[serde(default)]
    pub is_monitored: bool,
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u32,
    #[serde(default = "default_expected_status")]
    pub expected_status: u16,
}

fn default_check_interval() -> u32 {
    60
}

fn default_expected_status() -> u16 {
    200
}

/// Body for `POST /services`.
#[derive(Debug, Clone, Serialize)]
pub struct NewService {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_id: Option<i64>,
    pub name: String,
    pub url: String,
    pub service_type: String,
    pub is_monitored: bool,
    pub check_interval_seconds: u32,
    pub expected_status: u16,
}

impl Default for NewService {
    fn default() -> Self {
        Self {
            host_id: None,
            name: String::new(),
            url: String::new(),
            service_type: "http".into(),
            is_monitored: true,
            check_interval_seconds: default_check_interval(),
            expected_status: default_expected_status(),
        }
    }
}

/// Partial update for `PATCH /services/:id`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServicePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_monitored: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_interval_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_status: Option<u16>,
}

// ── Network devices ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkDeviceType {
    Router,
    Switch,
    Ap,
    Firewall,
    Modem,
    #[serde(other)]
    Other,
}

impl NetworkDeviceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Router => "router",
            Self::Switch => "switch",
            Self::Ap => "ap",
            Self::Firewall => "firewall",
            Self::Modem => "modem",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkDeviceStatus {
    Online,
    Offline,
    #[default]
    #[serde(other)]
    Unknown,
}

impl NetworkDeviceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDevice {
    pub id: i64,
    pub name: String,
    pub device_type: NetworkDeviceType,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub firmware_version: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: NetworkDeviceStatus,
}

/// Body for `POST /network`.
#[derive(Debug, Clone, Serialize)]
pub struct NewNetworkDevice {
    pub name: String,
    pub device_type: NetworkDeviceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Partial update for `PATCH /network/:id`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkDevicePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<NetworkDeviceStatus>,
}

// ── Incidents ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Active,
    Investigating,
    Resolved,
}

impl IncidentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Investigating => "investigating",
            Self::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub severity: Severity,
    pub status: IncidentStatus,
    pub started_at: DateTime<Utc>,
    /// Stamped by the server; non-null iff status is `resolved`.
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolution: Option<String>,
}

/// Body for `POST /incidents`.
#[derive(Debug, Clone, Serialize)]
pub struct NewIncident {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub severity: Severity,
    pub status: IncidentStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

/// Partial update for `PATCH /incidents/:id`. Clients never set
/// `resolved_at` — the server stamps it on the resolved transition.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IncidentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<IncidentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

// ── Smart home ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceDomain {
    Light,
    Switch,
    Sensor,
    BinarySensor,
    Climate,
    Lock,
    Cover,
    Fan,
    MediaPlayer,
    #[serde(other)]
    Other,
}

impl DeviceDomain {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Switch => "switch",
            Self::Sensor => "sensor",
            Self::BinarySensor => "binary_sensor",
            Self::Climate => "climate",
            Self::Lock => "lock",
            Self::Cover => "cover",
            Self::Fan => "fan",
            Self::MediaPlayer => "media_player",
            Self::Other => "other",
        }
    }

    /// Domains that respond to a tap-to-control action.
    pub fn is_controllable(self) -> bool {
        matches!(
            self,
            Self::Light | Self::Switch | Self::Fan | Self::Lock | Self::Cover
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCategory {
    Climate,
    Lighting,
    Security,
    Sensor,
    Media,
    Printer,
    #[default]
    General,
}

impl DeviceCategory {
    pub const ALL: [DeviceCategory; 7] = [
        Self::Climate,
        Self::Lighting,
        Self::Security,
        Self::Sensor,
        Self::Media,
        Self::Printer,
        Self::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Climate => "climate",
            Self::Lighting => "lighting",
            Self::Security => "security",
            Self::Sensor => "sensor",
            Self::Media => "media",
            Self::Printer => "printer",
            Self::General => "general",
        }
    }
}

/// A registered smart-home device.
///
/// `entity_id` is the opaque key of the external home-automation backend,
/// unique per integration. `last_state`/`last_attributes` are the cached
/// effective state, replaced wholesale by `state_changed` stream events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartDevice {
    pub id: i64,
    #[serde(default)]
    pub room_id: Option<i64>,
    pub integration_config_id: i64,
    pub entity_id: String,
    pub friendly_name: String,
    pub domain: DeviceDomain,
    #[serde(default)]
    pub device_class: Option<String>,
    #[serde(default)]
    pub category: DeviceCategory,
    #[serde(default)]
    pub last_state: Option<String>,
    #[serde(default)]
    pub last_attributes: Option<Value>,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub is_favorited: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// A room with its devices, as grouped by the dashboard endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomGroup {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub devices: Vec<SmartDevice>,
}

/// Snapshot of `GET /smarthome/dashboard`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SmartHomeDashboard {
    #[serde(default)]
    pub rooms: Vec<RoomGroup>,
    #[serde(default)]
    pub unassigned: Vec<SmartDevice>,
    #[serde(default)]
    pub total_devices: i64,
}

/// An entity reported by `GET /smarthome/discover`, keyed by domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredEntity {
    pub entity_id: String,
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub is_registered: bool,
}

/// Body for `POST /smarthome/devices/bulk-import`.
#[derive(Debug, Clone, Serialize)]
pub struct BulkImportRequest {
    pub entity_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<DeviceCategory>,
}

/// Result of a bulk import. Entity ids already registered are skipped,
/// never duplicated.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct BulkImportResult {
    pub registered_count: i64,
    #[serde(default)]
    pub skipped_count: i64,
}

/// The diff applied by a bulk update. `room_id` distinguishes "leave
/// unchanged" (absent) from "move to Unassigned" (explicit null).
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<DeviceCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
}

/// Body for `PATCH /smarthome/devices/bulk-update`.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceBulkUpdate {
    pub ids: Vec<i64>,
    pub updates: DeviceUpdates,
}

/// Counts returned by bulk update/delete. `failed > 0` is a partial
/// outcome, not an error — the operation is committed.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct BulkResult {
    pub updated: i64,
    #[serde(default)]
    pub failed: i64,
}

/// Action sent to `POST /smarthome/devices/:id/control`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    Toggle,
    Lock,
    Unlock,
}

impl ControlAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Toggle => "toggle",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
        }
    }
}

// ── Metrics ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Host,
    Container,
    Service,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Container => "container",
            Self::Service => "service",
        }
    }
}

/// One point of `GET /metrics/query`. The wire order is newest-first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub recorded_at: DateTime<Utc>,
    pub value: f64,
}

/// One record of `GET /metrics/latest` — the newest sample per
/// (source, metric_name).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricLatest {
    pub source_type: SourceType,
    pub source_id: i64,
    pub metric_name: String,
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
}

// ── Dashboard summary ────────────────────────────────────────────────

/// Total plus a per-status breakdown, e.g. `{"online": 4, "offline": 1}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: i64,
    #[serde(default)]
    pub by_status: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentSummary {
    pub active: i64,
    #[serde(default)]
    pub recent: Vec<Incident>,
}

/// Snapshot of `GET /dashboard`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub hosts: StatusCounts,
    pub containers: StatusCounts,
    pub services: StatusCounts,
    pub incidents: IncidentSummary,
}
