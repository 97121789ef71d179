//! Persisted application settings.
//!
//! Stored as a small JSON file; missing file or unreadable content
//! falls back to defaults so a corrupt settings file never blocks
//! startup.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Space opened on last shutdown, reopened on launch.
    pub last_space: Option<PathBuf>,
    /// Seconds of idle time before a dirty tab autosaves. Zero disables
    /// autosave.
    pub autosave_interval_secs: u64,
    pub theme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_space: None,
            autosave_interval_secs: 30,
            theme: "system".to_string(),
        }
    }
}

impl Settings {
    /// Conventional settings location under the platform config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gtdspace").join("settings.json"))
    }

    /// Load settings, falling back to defaults when the file is missing
    /// or unparsable.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unreadable settings, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write settings: {}", path.display()))
    }
}
