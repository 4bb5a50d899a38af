use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::format::FormatKind;

/// Defaults layered under the command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Format assumed when neither `--from` nor the file extension says.
    pub default_format: FormatKind,
    /// Pretty-print JSON output unless told otherwise.
    pub pretty: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            default_format: FormatKind::Json,
            pretty: false,
        }
    }
}

impl CliConfig {
    pub fn config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        PathBuf::from(home).join(".tagwire").join("config.json")
    }

    /// Load from ~/.tagwire/config.json.
    pub fn load() -> Option<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Option<Self> {
        if let Ok(data) = std::fs::read_to_string(path)
            && let Ok(config) = serde_json::from_str(&data)
        {
            return Some(config);
        }

        None
    }

    /// Save to ~/.tagwire/config.json.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, data)
    }
}
