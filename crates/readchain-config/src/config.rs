//! Main configuration types.
//!
//! This module provides the top-level [`ReadchainConfig`] struct and its builder.

use std::collections::HashMap;

use readchain_core::{Chain, ChainConfig, ChainSet};
use readchain_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, LogFormat, LoggingSection, MetricsSection};

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Complete readchain configuration: chains plus the ambient logging and
/// metrics settings.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use readchain_config::ReadchainConfig;
///
/// let config: ReadchainConfig = toml::from_str(r#"
///     [chains]
///     pipe = [{ filter = "gzip" }, { filter = "checksum", params = { algo = "crc32" } }]
/// "#).unwrap();
///
/// let chains = config.chain_config();
/// let names: Vec<_> = chains.get("pipe").unwrap().filter_names().collect();
/// assert_eq!(names, vec!["gzip", "checksum"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ReadchainConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsSection,

    /// Chains by name.
    #[serde(default)]
    pub chains: HashMap<String, Chain>,
}

impl ReadchainConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ReadchainConfigBuilder {
        ReadchainConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - A chain name is empty
    /// - A stage has an empty filter name
    /// - A log directive names an unknown level
    /// - The metrics service name is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, chain) in &self.chains {
            if name.is_empty() {
                return Err(ConfigError::validation_error("chain names must not be empty"));
            }
            for (position, stage) in chain.stages().iter().enumerate() {
                if stage.filter.is_empty() {
                    return Err(ConfigError::invalid_value(
                        format!("chains.{name}[{position}].filter"),
                        "must not be empty",
                    ));
                }
            }
        }

        validate_log_level(&self.logging.level)?;

        if self.metrics.service_name.is_empty() {
            return Err(ConfigError::invalid_value(
                "metrics.service_name",
                "must not be empty",
            ));
        }

        Ok(())
    }

    /// Check every stage against the filters registered with `chains`.
    ///
    /// Chains are checked in name order so the reported stage is stable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownFilter`] for the first stage whose filter
    /// is not registered.
    pub fn validate_filters(&self, chains: &ChainSet) -> Result<(), ConfigError> {
        let mut names: Vec<&String> = self.chains.keys().collect();
        names.sort_unstable();

        for name in names {
            for (position, filter) in self.chains[name].filter_names().enumerate() {
                if !chains.registry().contains(filter) {
                    return Err(ConfigError::unknown_filter(name.as_str(), position, filter));
                }
            }
        }
        Ok(())
    }

    /// Checks the chains against `chains`' registry and installs them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownFilter`] if a stage names an
    /// unregistered filter.
    pub fn configure(&self, chains: ChainSet) -> Result<ChainSet, ConfigError> {
        self.validate_filters(&chains)?;
        Ok(chains.with_config(self.chain_config()))
    }

    /// Returns the chains in the shape the resolution engine consumes.
    #[must_use]
    pub fn chain_config(&self) -> ChainConfig {
        ChainConfig {
            chains: self.chains.clone(),
        }
    }

    /// Returns the telemetry configuration for the logging and metrics
    /// sections.
    #[must_use]
    pub fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig::builder()
            .service_name(&self.metrics.service_name)
            .metrics(self.metrics.to_metrics_config())
            .logging(self.logging.to_log_config())
            .build()
    }

    /// Create a development configuration preset.
    ///
    /// Debug level, pretty output and source locations.
    ///
    /// # Example
    ///
    /// ```
    /// use readchain_config::ReadchainConfig;
    ///
    /// let config = ReadchainConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;

        config
    }

    /// Create a production configuration preset.
    ///
    /// # Example
    ///
    /// ```
    /// use readchain_config::{LogFormat, ReadchainConfig};
    ///
    /// let config = ReadchainConfig::production();
    /// assert_eq!(config.logging.format, LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.include_location = false;
        config.metrics.enabled = true;

        config
    }
}

impl From<ReadchainConfig> for ChainConfig {
    fn from(config: ReadchainConfig) -> Self {
        Self {
            chains: config.chains,
        }
    }
}

// Each comma-separated directive is `level` or `target=level`.
fn validate_log_level(level: &str) -> Result<(), ConfigError> {
    for directive in level.split(',').map(str::trim) {
        if directive.is_empty() {
            continue;
        }
        let level = directive.rsplit_once('=').map_or(directive, |(_, level)| level);
        if !LEVELS.iter().any(|known| known.eq_ignore_ascii_case(level)) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("unknown level {level:?} in directive {directive:?}"),
            ));
        }
    }
    Ok(())
}

/// Builder for [`ReadchainConfig`].
#[derive(Debug, Default)]
pub struct ReadchainConfigBuilder {
    logging: Option<LoggingSection>,
    metrics: Option<MetricsSection>,
    chains: HashMap<String, Chain>,
}

impl ReadchainConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingSection) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Set the metrics section.
    #[must_use]
    pub fn metrics(mut self, metrics: MetricsSection) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Add or replace the chain `name`.
    #[must_use]
    pub fn chain(mut self, name: impl Into<String>, chain: Chain) -> Self {
        self.chains.insert(name.into(), chain);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> ReadchainConfig {
        ReadchainConfig {
            logging: self.logging.unwrap_or_default(),
            metrics: self.metrics.unwrap_or_default(),
            chains: self.chains,
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<ReadchainConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
