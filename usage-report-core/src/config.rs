//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/usage-report/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/usage-report/` (~/.config/usage-report/)
//! - State/Logs: `$XDG_STATE_HOME/usage-report/` (~/.local/state/usage-report/)
//!
//! A few settings can be overridden from the environment:
//! - `USAGE_REPORT_LOGS_DIR` replaces `source.logs_dir`
//! - `USAGE_REPORT_PERIOD` replaces `report.period`

use crate::analytics::AggregateOptions;
use crate::error::{Error, Result};
use crate::period::ReportPeriod;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "usage-report";

/// Environment variable overriding the logs directory
pub const LOGS_DIR_ENV: &str = "USAGE_REPORT_LOGS_DIR";
/// Environment variable overriding the report period
pub const PERIOD_ENV: &str = "USAGE_REPORT_PERIOD";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Report period and sizing
    #[serde(default)]
    pub report: ReportConfig,

    /// Where log files are read from
    #[serde(default)]
    pub source: SourceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Report period and section sizes
#[derive(Debug, Deserialize)]
pub struct ReportConfig {
    /// Period used when no start date is given
    #[serde(default)]
    pub period: ReportPeriod,

    /// Fixed start date (YYYY-MM-DD)
    #[serde(default)]
    pub start_date: Option<NaiveDate>,

    /// Fixed end date (YYYY-MM-DD)
    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    /// Directory rendered reports are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Entries in the top intents list
    #[serde(default = "default_top_intents")]
    pub top_intents: usize,

    /// Entries in the slowest spans list
    #[serde(default = "default_slowest_spans")]
    pub slowest_spans: usize,

    /// Unique warning/error messages sampled into the report
    #[serde(default = "default_message_samples")]
    pub message_samples: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            period: ReportPeriod::default(),
            start_date: None,
            end_date: None,
            output_dir: default_output_dir(),
            top_intents: default_top_intents(),
            slowest_spans: default_slowest_spans(),
            message_samples: default_message_samples(),
        }
    }
}

impl ReportConfig {
    /// Section sizes for the aggregator.
    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            top_intents: self.top_intents,
            slowest_spans: self.slowest_spans,
            message_samples: self.message_samples,
        }
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.top_intents == 0 {
            return Err(Error::Config(
                "report.top_intents must be at least 1".to_string(),
            ));
        }
        if self.slowest_spans == 0 {
            return Err(Error::Config(
                "report.slowest_spans must be at least 1".to_string(),
            ));
        }
        if self.message_samples == 0 {
            return Err(Error::Config(
                "report.message_samples must be at least 1".to_string(),
            ));
        }
        if self.period == ReportPeriod::Custom
            && (self.start_date.is_none() || self.end_date.is_none())
        {
            return Err(Error::Config(
                "report.start_date and report.end_date are required for a custom period"
                    .to_string(),
            ));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(Error::InvalidDateRange { start, end });
            }
        }
        Ok(())
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./reports")
}

fn default_top_intents() -> usize {
    10
}

fn default_slowest_spans() -> usize {
    5
}

fn default_message_samples() -> usize {
    10
}

/// Log source configuration
#[derive(Debug, Deserialize)]
pub struct SourceConfig {
    /// Directory containing the application's log files
    #[serde(default)]
    pub logs_dir: Option<PathBuf>,

    /// Glob pattern for log files, relative to `logs_dir`
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            logs_dir: None,
            pattern: default_pattern(),
        }
    }
}

fn default_pattern() -> String {
    "*.log".to_string()
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path, then apply environment
    /// overrides.
    ///
    /// The result is not validated; callers merge their own overrides first
    /// and then call [`ReportConfig::validate`].
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(LOGS_DIR_ENV).filter(|v| !v.is_empty()) {
            self.source.logs_dir = Some(PathBuf::from(dir));
        }
        if let Some(period) = lookup(PERIOD_ENV).filter(|v| !v.is_empty()) {
            self.report.period = period
                .parse()
                .map_err(|e| Error::Config(format!("{}: {}", PERIOD_ENV, e)))?;
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/usage-report/config.toml` (~/.config/usage-report/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join(APP_DIR).join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/usage-report/` (~/.local/state/usage-report/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join(APP_DIR)
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/usage-report/usage-report.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("usage-report.log")
    }
}
