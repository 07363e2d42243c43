//! Shared configuration for the opsdeck console.
//!
//! TOML profiles with env overrides (figment), credential resolution
//! (inline value or named environment variable), and translation to
//! `opsdeck_core::ConsoleConfig`. Also owns the persisted UI preferences
//! ([`prefs`]) — the only durable client state.

pub mod prefs;

use std::collections::HashMap;
use std::path::PathBuf;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use opsdeck_core::ConsoleConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            profiles: HashMap::new(),
        }
    }
}

/// A named backend profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g. "http://127.0.0.1:8000").
    pub url: String,

    /// Bearer token, inline. Prefer `api_token_env` for shared configs.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Name of an environment variable holding the token.
    #[serde(default)]
    pub api_token_env: Option<String>,

    /// LIVE-mode dashboard refresh interval (seconds).
    #[serde(default = "default_dashboard_refresh")]
    pub dashboard_refresh_secs: u64,

    /// Smart-home fallback poll interval (seconds).
    #[serde(default = "default_smarthome_refresh")]
    pub smarthome_refresh_secs: u64,

    /// Whether to open the smart-home event stream.
    #[serde(default = "default_true")]
    pub sse_enabled: bool,
}

fn default_dashboard_refresh() -> u64 {
    30
}
fn default_smarthome_refresh() -> u64 {
    60
}
fn default_true() -> bool {
    true
}

// ── Paths ───────────────────────────────────────────────────────────

/// Platform config directory for opsdeck (e.g. `~/.config/opsdeck`).
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "opsdeck").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Path of the main config file.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load the config: TOML file first, `OPSDECK_*` env vars on top.
pub fn load_config() -> Result<Config, ConfigError> {
    let mut figment = Figment::new();

    if let Some(path) = config_path() {
        figment = figment.merge(Toml::file(path));
    }

    let config = figment
        .merge(Env::prefixed("OPSDECK_").split("__"))
        .extract()?;

    Ok(config)
}

/// Load a config from an explicit file path (tests, `--config` flag).
pub fn load_config_from(path: &std::path::Path) -> Result<Config, ConfigError> {
    let config = Figment::new().merge(Toml::file(path)).extract()?;
    Ok(config)
}

/// Resolve a profile into a runtime [`ConsoleConfig`].
pub fn profile_to_console_config(
    profile: &Profile,
    name: &str,
) -> Result<ConsoleConfig, ConfigError> {
    let url = profile
        .url
        .parse()
        .map_err(|e| ConfigError::Validation {
            field: format!("profiles.{name}.url"),
            reason: format!("{e}"),
        })?;

    let api_token = resolve_token(profile);

    Ok(ConsoleConfig {
        url,
        api_token,
        dashboard_refresh_secs: profile.dashboard_refresh_secs,
        smarthome_refresh_secs: profile.smarthome_refresh_secs,
        sse_enabled: profile.sse_enabled,
    })
}

/// Look up the named profile (or the default) and resolve it.
pub fn resolve_profile(config: &Config, name: Option<&str>) -> Result<ConsoleConfig, ConfigError> {
    let profile_name = name
        .or(config.default_profile.as_deref())
        .unwrap_or("default");

    let profile = config
        .profiles
        .get(profile_name)
        .ok_or_else(|| ConfigError::UnknownProfile {
            profile: profile_name.to_owned(),
        })?;

    profile_to_console_config(profile, profile_name)
}

/// Inline token wins; otherwise read the named environment variable.
fn resolve_token(profile: &Profile) -> Option<SecretString> {
    if let Some(ref token) = profile.api_token {
        return Some(SecretString::from(token.clone()));
    }
    if let Some(ref var) = profile.api_token_env {
        if let Ok(value) = std::env::var(var) {
            return Some(SecretString::from(value));
        }
        tracing::warn!(var, "api_token_env points at an unset variable");
    }
    None
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_profile_with_defaults() {
        let file = write_config(
            r#"
            default_profile = "home"

            [profiles.home]
            url = "http://10.0.0.2:8000"
            "#,
        );

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("home"));

        let console = resolve_profile(&config, None).unwrap();
        assert_eq!(console.url.as_str(), "http://10.0.0.2:8000/");
        assert_eq!(console.dashboard_refresh_secs, 30);
        assert_eq!(console.smarthome_refresh_secs, 60);
        assert!(console.sse_enabled);
        assert!(console.api_token.is_none());
    }

    #[test]
    fn explicit_profile_overrides_default() {
        let file = write_config(
            r#"
            default_profile = "home"

            [profiles.home]
            url = "http://10.0.0.2:8000"

            [profiles.lab]
            url = "http://10.0.0.9:8000"
            dashboard_refresh_secs = 10
            sse_enabled = false
            "#,
        );

        let config = load_config_from(file.path()).unwrap();
        let console = resolve_profile(&config, Some("lab")).unwrap();

        assert_eq!(console.url.host_str(), Some("10.0.0.9"));
        assert_eq!(console.dashboard_refresh_secs, 10);
        assert!(!console.sse_enabled);
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let file = write_config(
            r#"
            [profiles.home]
            url = "http://10.0.0.2:8000"
            "#,
        );

        let config = load_config_from(file.path()).unwrap();
        let err = resolve_profile(&config, Some("nope")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile { .. }));
    }

    #[test]
    fn invalid_url_is_a_validation_error() {
        let file = write_config(
            r#"
            [profiles.home]
            url = "not a url"
            "#,
        );

        let config = load_config_from(file.path()).unwrap();
        let err = resolve_profile(&config, Some("home")).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }
}
