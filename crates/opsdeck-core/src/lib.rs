// opsdeck-core: domain layer between opsdeck-api and the console.
//
// Controllers are value types with explicit state and named handler
// methods; async IO happens in the caller's tasks and flows back through
// generation-guarded `apply_*` calls.

pub mod config;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod poll;

/// Entity and wire types, re-exported from the API crate. The backend's
/// JSON shapes double as the domain model — controllers hold snapshots,
/// the server owns identity.
pub use opsdeck_api::types as model;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ConsoleConfig;
pub use controller::{
    DashboardController, DashboardLoad, HostDetailController, HostTab, IncidentController,
    IncidentFilter, MetricsPanel, Notice, NoticeLevel, SmartHomeController,
};
pub use error::{CoreError, ErrorKind};
pub use metrics::{MetricsRange, MetricsView, fetch_metrics};
pub use poll::Poller;
