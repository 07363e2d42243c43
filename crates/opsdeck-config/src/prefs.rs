//! Persisted UI preferences.
//!
//! The only durable client state: a small TOML file with two well-known
//! keys, `dashboard_vehicle_id` and `theme`. Writing either persists the
//! file and publishes a change event on a watch channel, so listening
//! views react without a reload — the console's equivalent of the
//! `vehicle-selection-changed` / `theme-changed` document events.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::ConfigError;

/// Stable key: selected vehicle for the landing dashboard, or `"all"`.
pub const KEY_DASHBOARD_VEHICLE_ID: &str = "dashboard_vehicle_id";
/// Stable key: active theme name.
pub const KEY_THEME: &str = "theme";

/// A preference change, published to listeners on every write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefChange {
    /// Nothing written yet this session.
    None,
    VehicleSelectionChanged(String),
    ThemeChanged(String),
}

/// The preference values themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiPrefs {
    #[serde(default = "default_vehicle")]
    pub dashboard_vehicle_id: String,
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_vehicle() -> String {
    "all".into()
}

fn default_theme() -> String {
    "catppuccin".into()
}

impl Default for UiPrefs {
    fn default() -> Self {
        Self {
            dashboard_vehicle_id: default_vehicle(),
            theme: default_theme(),
        }
    }
}

/// Store binding the preference values to their file, with change
/// notification.
pub struct PrefsStore {
    path: PathBuf,
    prefs: UiPrefs,
    changes: watch::Sender<PrefChange>,
}

impl PrefsStore {
    /// Default location: `prefs.toml` next to the main config file.
    pub fn default_path() -> Option<PathBuf> {
        crate::config_dir().map(|dir| dir.join("prefs.toml"))
    }

    /// Open the store, reading existing values or falling back to
    /// defaults for a missing or unreadable file.
    pub fn open(path: PathBuf) -> Self {
        let prefs = Self::read(&path).unwrap_or_default();
        let (changes, _) = watch::channel(PrefChange::None);
        Self {
            path,
            prefs,
            changes,
        }
    }

    fn read(path: &Path) -> Option<UiPrefs> {
        let raw = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&raw) {
            Ok(prefs) => Some(prefs),
            Err(e) => {
                tracing::warn!(error = %e, "prefs file unreadable, using defaults");
                None
            }
        }
    }

    pub fn prefs(&self) -> &UiPrefs {
        &self.prefs
    }

    /// Subscribe to preference changes.
    pub fn subscribe(&self) -> watch::Receiver<PrefChange> {
        self.changes.subscribe()
    }

    /// Write the selected vehicle and notify listeners.
    pub fn set_dashboard_vehicle_id(&mut self, id: impl Into<String>) -> Result<(), ConfigError> {
        self.prefs.dashboard_vehicle_id = id.into();
        self.persist()?;
        let _ = self.changes.send(PrefChange::VehicleSelectionChanged(
            self.prefs.dashboard_vehicle_id.clone(),
        ));
        Ok(())
    }

    /// Write the active theme and notify listeners.
    pub fn set_theme(&mut self, theme: impl Into<String>) -> Result<(), ConfigError> {
        self.prefs.theme = theme.into();
        self.persist()?;
        let _ = self
            .changes
            .send(PrefChange::ThemeChanged(self.prefs.theme.clone()));
        Ok(())
    }

    fn persist(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(&self.prefs)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = PrefsStore::open(dir.path().join("prefs.toml"));

        assert_eq!(store.prefs().dashboard_vehicle_id, "all");
        assert_eq!(store.prefs().theme, "catppuccin");
    }

    #[test]
    fn writes_round_trip_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.toml");

        let mut store = PrefsStore::open(path.clone());
        store.set_dashboard_vehicle_id("42").unwrap();
        store.set_theme("lcars").unwrap();

        let reopened = PrefsStore::open(path);
        assert_eq!(reopened.prefs().dashboard_vehicle_id, "42");
        assert_eq!(reopened.prefs().theme, "lcars");
    }

    #[test]
    fn writes_publish_change_events_without_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PrefsStore::open(dir.path().join("prefs.toml"));
        let rx = store.subscribe();

        store.set_dashboard_vehicle_id("7").unwrap();
        assert_eq!(
            *rx.borrow(),
            PrefChange::VehicleSelectionChanged("7".into())
        );

        store.set_theme("lcars").unwrap();
        assert_eq!(*rx.borrow(), PrefChange::ThemeChanged("lcars".into()));
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.toml");
        std::fs::write(&path, "this is not toml [").unwrap();

        let store = PrefsStore::open(path);
        assert_eq!(store.prefs().theme, "catppuccin");
    }
}
