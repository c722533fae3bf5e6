//! Studio configuration persistence
//!
//! Stores user preferences in `~/.config/swatch/config.yaml`

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StudioError};
use crate::model::pipeline::DEFAULT_QUIET_PERIOD_MS;

/// Worker-loading configuration for the embedded editor widget
///
/// Created once at startup and handed to the runtime; nothing reads it from
/// global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorEnvironment {
    /// Worker script for the TypeScript and JavaScript language services
    #[serde(default = "default_script_worker")]
    pub script_worker: String,
    /// Worker script for every other language
    #[serde(default = "default_editor_worker")]
    pub editor_worker: String,
    /// Per-label overrides, consulted first
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, String>,
}

fn default_script_worker() -> String {
    "./ts.worker.js".to_string()
}

fn default_editor_worker() -> String {
    "./editor.worker.js".to_string()
}

impl Default for EditorEnvironment {
    fn default() -> Self {
        Self {
            script_worker: default_script_worker(),
            editor_worker: default_editor_worker(),
            overrides: BTreeMap::new(),
        }
    }
}

impl EditorEnvironment {
    /// Worker URL for a language label (`typescript`, `css`, ...)
    pub fn worker_url(&self, label: &str) -> &str {
        if let Some(url) = self.overrides.get(label) {
            return url;
        }
        match label {
            "typescript" | "javascript" => &self.script_worker,
            _ => &self.editor_worker,
        }
    }
}

/// Studio configuration that persists across sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudioConfig {
    /// Quiet period before an edit is published
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Name of the file seeded into a new session
    #[serde(default = "default_file_name")]
    pub default_file_name: String,

    /// How long `run_until_idle` waits for outstanding renders
    #[serde(default = "default_render_timeout_ms")]
    pub render_timeout_ms: u64,

    #[serde(default)]
    pub editor: EditorEnvironment,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_QUIET_PERIOD_MS
}

fn default_file_name() -> String {
    "App.tsx".to_string()
}

fn default_render_timeout_ms() -> u64 {
    2000
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            default_file_name: default_file_name(),
            render_timeout_ms: default_render_timeout_ms(),
            editor: EditorEnvironment::default(),
        }
    }
}

impl StudioConfig {
    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Load config from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| StudioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|e| StudioError::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
        })
    }

    /// Save config to disk
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let path = crate::config_paths::config_file().ok_or_else(|| StudioError::Config {
            message: "no config directory available".to_string(),
        })?;
        self.save_to(&path)?;
        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Save config to an explicit path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StudioError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = serde_yaml::to_string(self).map_err(|e| StudioError::Config {
            message: format!("failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|source| StudioError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
