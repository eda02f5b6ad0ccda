//! Persistent daemon settings (JSON file).

use std::fs;
use std::path::Path;

use awaaz_core::{parser::apps, Language};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct AppSettings {
    /// Whether classified payments are announced. Persistence is not
    /// affected by this switch.
    pub announcements_enabled: bool,
    /// Announcement language.
    pub language: Language,
    /// Package identifiers to monitor on top of the built-in UPI allow list.
    pub extra_monitored_apps: Vec<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            announcements_enabled: true,
            language: Language::En,
            extra_monitored_apps: Vec::new(),
        }
    }
}

impl AppSettings {
    pub fn normalize(&mut self) {
        self.extra_monitored_apps = self
            .extra_monitored_apps
            .iter()
            .map(|app| app.trim().to_string())
            .filter(|app| !app.is_empty())
            .collect();
        self.extra_monitored_apps.sort();
        self.extra_monitored_apps.dedup();
    }

    /// Allow-list check: the built-in UPI table plus any user extras.
    pub fn is_monitored(&self, app_id: &str) -> bool {
        apps::is_monitored_app(app_id) || self.extra_monitored_apps.iter().any(|a| a == app_id)
    }
}

/// Load settings from `path`. A missing file yields defaults; a corrupt file
/// is logged and replaced by defaults rather than stopping the daemon.
pub fn load_settings(path: &Path) -> AppSettings {
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str::<AppSettings>(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("settings file {path:?} is corrupt ({e}), using defaults");
                AppSettings::default()
            }
        },
        Err(_) => AppSettings::default(),
    };
    settings.normalize();
    settings
}

/// Persist settings as pretty JSON.
pub fn save_settings(path: &Path, settings: &AppSettings) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(settings)?)?;
    Ok(())
}
