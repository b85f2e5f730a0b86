//! Configuration — loads optional ~/.mecha/config.yaml.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::logger::Level;

/// Front-end settings. Command-line flags take precedence.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MechaConfig {
    /// Where the token dump is written.
    pub output: PathBuf,
    /// Record the rule trace and log every token.
    pub debug: bool,
    pub log_level: Level,
}

impl Default for MechaConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("output"),
            debug: false,
            log_level: Level::Info,
        }
    }
}

impl MechaConfig {
    pub fn from_yaml(content: &str) -> Option<Self> {
        serde_yaml::from_str(content).ok()
    }

    pub fn from_file(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        Self::from_yaml(&content)
    }

    /// The level the logger runs at; debug mode always lowers it to `Debug`.
    pub fn effective_level(&self) -> Level {
        if self.debug {
            Level::Debug
        } else {
            self.log_level
        }
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".mecha").join("config.yaml"))
}

/// Load ~/.mecha/config.yaml, falling back to defaults when it is missing or
/// unreadable.
pub fn load_config() -> MechaConfig {
    config_path()
        .and_then(|path| MechaConfig::from_file(&path))
        .unwrap_or_default()
}
