//! Configuration file support for weightWatcher.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/weightwatcher/config.toml`.
//! A missing file means defaults; a malformed one is fatal.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct DataConfig {
    /// Data file used when --file is not given
    #[serde(default)]
    pub file: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub verbose: bool,
}

/// Report window configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Calendar days averaged by the summary report
    #[serde(default = "default_summary_days")]
    pub summary_days: u32,

    /// Moving average window used when --periods is not given
    #[serde(default = "default_history_periods")]
    pub history_periods: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            summary_days: default_summary_days(),
            history_periods: default_history_periods(),
        }
    }
}

// Default value functions
fn default_summary_days() -> u32 {
    5
}

fn default_history_periods() -> usize {
    7
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_config_path())
    }

    /// Load configuration from a specific path
    ///
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents).map_err(|source| Error::ConfigSyntax {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var_os("HOME").unwrap_or_default();
            PathBuf::from(home).join(".config")
        });
        base.join("weightwatcher").join("config.toml")
    }

    /// Reject values the reports cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.report.summary_days == 0 {
            return Err(Error::Config("report.summary_days must be at least 1".into()));
        }
        if self.report.history_periods == 0 {
            return Err(Error::Config(
                "report.history_periods must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
