//! CLI configuration.

use hashpay_channel::ChannelConfig;
use hashpay_types::{Amount, BlockNumber, DEFAULT_REVEAL_TIMEOUT, DEFAULT_SETTLE_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CliError, CliResult};

/// CLI configuration loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Channel parameters.
    pub channel: ChannelSection,
    /// Benchmark parameters.
    pub benchmark: BenchmarkSection,
}

impl CliConfig {
    /// Load configuration from a file.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location.
    pub fn load_default() -> CliResult<Self> {
        Self::load(&default_config_path())
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> CliResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject parameter combinations no channel can work with.
    pub fn validate(&self) -> CliResult<()> {
        if self.channel.reveal_timeout == 0 {
            return Err(CliError::config("channel.reveal_timeout must be at least 1"));
        }
        if self.channel.settle_timeout < self.channel.reveal_timeout {
            return Err(CliError::config(
                "channel.settle_timeout must not be below channel.reveal_timeout",
            ));
        }
        Ok(())
    }
}

/// `[channel]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSection {
    /// Minimum blocks until a new lock expires.
    pub reveal_timeout: BlockNumber,
    /// Maximum blocks until a new lock expires.
    pub settle_timeout: BlockNumber,
    /// Minimum combined deposit to open a channel.
    pub min_deposit: Amount,
    /// Superseded transfers kept per channel end.
    pub history_limit: usize,
}

impl Default for ChannelSection {
    fn default() -> Self {
        let defaults = ChannelConfig::default();
        Self {
            reveal_timeout: DEFAULT_REVEAL_TIMEOUT,
            settle_timeout: DEFAULT_SETTLE_TIMEOUT,
            min_deposit: defaults.min_deposit,
            history_limit: defaults.history_limit,
        }
    }
}

impl ChannelSection {
    /// Ledger configuration for these parameters.
    pub fn to_channel_config(&self) -> ChannelConfig {
        ChannelConfig::new(self.reveal_timeout, self.settle_timeout)
            .with_min_deposit(self.min_deposit)
            .with_history_limit(self.history_limit)
    }
}

/// `[benchmark]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkSection {
    /// Transfers per `speed` run.
    pub transfers: u64,
    /// Pending locks allowed before the oldest is claimed.
    pub max_locked: u64,
}

impl Default for BenchmarkSection {
    fn default() -> Self {
        Self {
            transfers: 10_000,
            max_locked: 100,
        }
    }
}

/// Base directory for hashpay data.
///
/// `HASHPAY_DATA_DIR` wins over the platform data directory.
pub fn default_base_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("HASHPAY_DATA_DIR") {
        return PathBuf::from(dir);
    }

    directories::ProjectDirs::from("io", "hashpay", "hashpay")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| {
            std::env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".hashpay")
        })
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    default_base_dir().join("config.toml")
}
