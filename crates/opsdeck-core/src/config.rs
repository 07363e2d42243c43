// ── Runtime connection configuration ──
//
// Describes *how* to reach the infrastructure backend. Carries credential
// data and refresh tuning, but never touches disk -- the TUI constructs a
// `ConsoleConfig` from CLI flags / the config file and hands it in.

use secrecy::SecretString;
use url::Url;

/// Configuration for one backend connection.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Backend base URL (e.g. `http://127.0.0.1:8000`). The
    /// `/api/infrastructure/` prefix is appended by the client.
    pub url: Url,
    /// Optional bearer token for the backend.
    pub api_token: Option<SecretString>,
    /// Dashboard auto-refresh interval (seconds) while LIVE mode is on.
    pub dashboard_refresh_secs: u64,
    /// Smart-home fallback poll interval (seconds). Runs alongside the
    /// SSE stream as a safety net for missed events.
    pub smarthome_refresh_secs: u64,
    /// Whether to open the smart-home SSE subscription.
    pub sse_enabled: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000"
                .parse()
                .expect("default URL is valid"),
            api_token: None,
            dashboard_refresh_secs: 30,
            smarthome_refresh_secs: 60,
            sse_enabled: true,
        }
    }
}
