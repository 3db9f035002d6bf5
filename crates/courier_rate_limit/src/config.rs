//! Configuration for the forwarding engine.
//!
//! The configuration system supports:
//! - Bundled defaults (include_str! from courier.toml)
//! - User overrides (./courier.toml or ~/.config/courier/courier.toml)
//! - Environment overrides (`COURIER_FORWARDING__RETRY_INTERVAL_SECS=30`)
//!
//! Later sources take precedence over earlier ones.

use config::{Config, Environment, File, FileFormat};
use courier_error::ConfigError;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../courier.toml");

/// Timing parameters of the forwarding engine.
///
/// # Example
///
/// ```toml
/// [forwarding]
/// retry_interval_secs = 10
/// bulk_interval_secs = 5
/// bulk_pacing_millis = 1000
/// progress_every = 10
/// max_forwards_per_minute = 20
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Builder)]
#[builder(default, build_fn(private, name = "build_internal"))]
pub struct ForwardingConfig {
    /// Seconds between retry-queue drain attempts
    #[serde(default = "default_retry_interval")]
    pub retry_interval_secs: u64,

    /// Seconds between bulk-replay queue checks
    #[serde(default = "default_bulk_interval")]
    pub bulk_interval_secs: u64,

    /// Pause after each delivered bulk item, in milliseconds
    #[serde(default = "default_bulk_pacing")]
    pub bulk_pacing_millis: u64,

    /// Emit a progress notification every N bulk items
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,

    /// Optional cap on forwards per minute, shared by all producers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(setter(strip_option))]
    pub max_forwards_per_minute: Option<u32>,
}

fn default_retry_interval() -> u64 {
    10
}

fn default_bulk_interval() -> u64 {
    5
}

fn default_bulk_pacing() -> u64 {
    1000
}

fn default_progress_every() -> usize {
    10
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            retry_interval_secs: default_retry_interval(),
            bulk_interval_secs: default_bulk_interval(),
            bulk_pacing_millis: default_bulk_pacing(),
            progress_every: default_progress_every(),
            max_forwards_per_minute: None,
        }
    }
}

impl ForwardingConfigBuilder {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the result fails [`ForwardingConfig::validate`].
    pub fn build(&self) -> Result<ForwardingConfig, ConfigError> {
        let config = self
            .build_internal()
            .map_err(|e| ConfigError::new(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl ForwardingConfig {
    /// Interval of the retry-queue background loop.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    /// Interval of the bulk-replay background loop.
    pub fn bulk_interval(&self) -> Duration {
        Duration::from_secs(self.bulk_interval_secs)
    }

    /// Pause between consecutive bulk items.
    pub fn bulk_pacing(&self) -> Duration {
        Duration::from_millis(self.bulk_pacing_millis)
    }

    /// Reject values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an interval or the progress period is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_interval_secs == 0 {
            return Err(ConfigError::out_of_range("retry_interval_secs", "at least 1"));
        }
        if self.bulk_interval_secs == 0 {
            return Err(ConfigError::out_of_range("bulk_interval_secs", "at least 1"));
        }
        if self.progress_every == 0 {
            return Err(ConfigError::out_of_range("progress_every", "at least 1"));
        }
        if self.max_forwards_per_minute == Some(0) {
            return Err(ConfigError::out_of_range(
                "max_forwards_per_minute",
                "at least 1 when set",
            ));
        }
        Ok(())
    }
}

/// Top-level Courier configuration.
///
/// # Example
///
/// ```no_run
/// use courier_rate_limit::CourierConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CourierConfig::load()?;
/// println!("Retry every {:?}", config.forwarding.retry_interval());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct CourierConfig {
    /// Forwarding engine timing
    #[serde(default)]
    pub forwarding: ForwardingConfig,
}

impl CourierConfig {
    /// Load configuration from a specific file path, on top of bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        debug!("Loading configuration from file");

        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()));

        Self::finish(builder)
    }

    /// Load configuration with precedence: env > current dir > home dir > bundled defaults.
    ///
    /// User config files are optional and silently skipped if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if a present source cannot be parsed or the merged
    /// configuration fails validation.
    #[instrument]
    pub fn load() -> Result<Self, ConfigError> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/courier/courier.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("courier").required(false))
            .add_source(
                Environment::with_prefix("COURIER")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let config: Self = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;

        config.forwarding.validate()?;
        Ok(config)
    }
}
