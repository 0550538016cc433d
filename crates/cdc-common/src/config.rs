//! ---
//! cdc_section: "01-bus-core"
//! cdc_subsection: "module"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "Shared configuration and logging for the changer runtime."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_rx_pool_capacity() -> usize {
    32
}

fn default_tx_pool_capacity() -> usize {
    32
}

fn default_tx_gap() -> Duration {
    Duration::from_millis(10)
}

fn default_announce_retry_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_announce_retry_budget() -> u32 {
    30
}

fn default_disc_probe_delay() -> Duration {
    Duration::from_millis(100)
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

/// Primary configuration object for the changer daemon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub changer: ChangerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Environment variable that overrides the configuration search path.
    pub const ENV_CONFIG_PATH: &'static str = "CDC_CONFIG";

    /// Load configuration from disk, respecting the `CDC_CONFIG` override.
    /// The first existing candidate wins; a missing file set falls back to
    /// the built-in defaults so the daemon can boot without any config.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            let path = PathBuf::from(&env_path);
            if !path.exists() {
                return Err(anyhow!(
                    "config path from {} does not exist: {}",
                    Self::ENV_CONFIG_PATH,
                    path.display()
                ));
            }
            return Self::load_path(&path);
        }

        for candidate in candidates {
            let path = candidate.as_ref();
            if path.exists() {
                return Self::load_path(path);
            }
        }

        debug!("no configuration file found; using built-in defaults");
        Ok(Self::default())
    }

    fn load_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}

/// Physical bus transport settings.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Number of slots in the inbound frame pool.
    #[serde(default = "default_rx_pool_capacity")]
    pub rx_pool_capacity: usize,
    /// Number of slots in the outbound frame pool.
    #[serde(default = "default_tx_pool_capacity")]
    pub tx_pool_capacity: usize,
    /// Quiet gap between back-to-back transmissions so the radio can keep up.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_tx_gap", rename = "tx_gap_ms")]
    pub tx_gap: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            rx_pool_capacity: default_rx_pool_capacity(),
            tx_pool_capacity: default_tx_pool_capacity(),
            tx_gap: default_tx_gap(),
        }
    }
}

/// Changer state machine timing settings.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangerConfig {
    /// Interval between announce attempts while the radio has not spoken.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(
        default = "default_announce_retry_interval",
        rename = "announce_retry_interval_ms"
    )]
    pub announce_retry_interval: Duration,
    /// Maximum number of announces sent before going quiet.
    #[serde(default = "default_announce_retry_budget")]
    pub announce_retry_budget: u32,
    /// Dwell time between the two disc-check reports for one slot.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_disc_probe_delay", rename = "disc_probe_delay_ms")]
    pub disc_probe_delay: Duration,
}

impl Default for ChangerConfig {
    fn default() -> Self {
        Self {
            announce_retry_interval: default_announce_retry_interval(),
            announce_retry_budget: default_announce_retry_budget(),
            disc_probe_delay: default_disc_probe_delay(),
        }
    }
}

/// Logging output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory that receives the rolling daily log file.
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    /// Optional file prefix; defaults to the service name.
    #[serde(default)]
    pub file_prefix: Option<String>,
    /// Stdout format.
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            file_prefix: None,
            format: default_log_format(),
        }
    }
}
