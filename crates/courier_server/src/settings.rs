//! Server settings loaded from TOML.

use courier_error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Process-level settings of the relay server.
///
/// # Example
///
/// ```toml
/// port = 10000
/// data_file = "channels_data.json"
/// dry_run = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Port the liveness/status endpoint listens on
    #[serde(default = "default_port")]
    pub port: u16,
    /// JSON file holding monitored channels and the destination
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    /// Validate configuration and exit without serving
    #[serde(default)]
    pub dry_run: bool,
}

fn default_port() -> u16 {
    10000
}

fn default_data_file() -> PathBuf {
    PathBuf::from("channels_data.json")
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            data_file: default_data_file(),
            dry_run: false,
        }
    }
}

impl ServerSettings {
    /// Load settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or the TOML is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::new(format!("Failed to read {}: {e}", path.display())))?;
        toml::from_str(&contents)
            .map_err(|e| ConfigError::new(format!("Invalid settings in {}: {e}", path.display())))
    }

    /// Load settings from `path` if it exists, otherwise use defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be parsed.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            debug!(path = %path.display(), "No settings file, using defaults");
            Ok(Self::default())
        }
    }
}
