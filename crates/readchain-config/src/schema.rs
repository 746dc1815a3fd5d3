//! Configuration schema types.
//!
//! This module defines the sections that sit next to the chain table in a
//! configuration file.

use readchain_telemetry::{LogConfig, MetricsConfig};
use serde::{Deserialize, Serialize};

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging section.
///
/// # Example
///
/// ```
/// use readchain_config::{LogFormat, LoggingSection};
///
/// let logging: LoggingSection = toml::from_str(r#"
///     level = "readchain_core=debug,info"
///     format = "pretty"
/// "#).unwrap();
///
/// assert!(logging.enabled);
/// assert_eq!(logging.format, LogFormat::Pretty);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directives (e.g. "info" or "readchain_core=debug,warn").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

impl LoggingSection {
    /// Converts the section into the logging subscriber's configuration.
    pub fn to_log_config(&self) -> LogConfig {
        let base = match self.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            file_line_info: self.include_location,
            ..base
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Enable the metrics recorder.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Value of the `service` label attached to every metric.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: default_service_name(),
        }
    }
}

impl MetricsSection {
    /// Converts the section into the metrics recorder's configuration.
    pub fn to_metrics_config(&self) -> MetricsConfig {
        MetricsConfig {
            enabled: self.enabled,
            service_name: self.service_name.clone(),
        }
    }
}

fn default_service_name() -> String {
    "readchain".to_string()
}

fn default_true() -> bool {
    true
}
