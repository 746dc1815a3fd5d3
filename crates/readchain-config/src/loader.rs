//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::{ConfigError, LogFormat, ReadchainConfig};

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file or string (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use readchain_config::ConfigLoader;
///
/// # fn main() -> Result<(), readchain_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("chains.toml")?
///     .with_env_prefix("READCHAIN")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: ReadchainConfig,
    env_prefix: Option<String>,
    file_loaded: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ReadchainConfig::default(),
            env_prefix: None,
            file_loaded: false,
        }
    }

    /// Start with default configuration values.
    ///
    /// This is called automatically by `new()`, but can be chained for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = ReadchainConfig::default();
        self
    }

    /// Start with development preset configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use readchain_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = ReadchainConfig::development();
        self
    }

    /// Start with production preset configuration.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = ReadchainConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// Supports TOML (.toml) and JSON (.json) formats.
    /// The file format is determined by the file extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let file_config = Self::parse_file(&content, path)?;
        self.merge_config(file_config);
        self.file_loaded = true;

        tracing::debug!(
            path = %path.display(),
            chains = self.config.chains.len(),
            "Loaded configuration file"
        );

        Ok(self)
    }

    /// Load configuration from an optional file.
    ///
    /// If the file exists, loads it. If not, silently continues.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string.
    ///
    /// # Arguments
    ///
    /// * `content` - Configuration content as a string
    /// * `format` - Content format ("toml" or "json")
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use readchain_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [chains]
    ///     pipe = [{ filter = "gzip" }]
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.chains["pipe"].len(), 1);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let parsed = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };

        self.merge_config(parsed);
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`.
    /// For example, with prefix "READCHAIN":
    /// - `READCHAIN__LOGGING__LEVEL=debug`
    /// - `READCHAIN__METRICS__ENABLED=false`
    /// - `READCHAIN__CHAINS__PIPE__1__EXPECT=3421780262` sets the `expect`
    ///   parameter of stage 1 of chain `pipe`
    ///
    /// Chain names match case-insensitively. Parameter values parse as JSON,
    /// falling back to a plain string.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file from the current directory or its parents.
    ///
    /// A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a file is found but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "Loaded environment file");
                Ok(self)
            }
            Err(err) if err.not_found() => Ok(self),
            Err(err) => Err(ConfigError::dotenv_error(".env", err)),
        }
    }

    /// Load variables from the `.env`-style file at `path`.
    ///
    /// Variables already set in the environment keep their values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file does not exist or cannot be parsed.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        dotenvy::from_path(path).map_err(|err| ConfigError::dotenv_error(path, err))?;
        Ok(self)
    }

    /// Returns true if a configuration file was loaded.
    #[must_use]
    pub fn file_loaded(&self) -> bool {
        self.file_loaded
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Environment variable parsing fails
    /// - Configuration validation fails
    pub fn load(mut self) -> Result<ReadchainConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without validation.
    #[must_use]
    pub fn load_unvalidated(self) -> ReadchainConfig {
        self.config
    }

    // Parse configuration file based on extension
    fn parse_file(content: &str, path: &Path) -> Result<ReadchainConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    // Later layers replace earlier ones wholesale
    fn merge_config(&mut self, parsed: ReadchainConfig) {
        self.config = parsed;
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let scope = format!("{prefix}__");
        let mut env_vars: Vec<(String, String)> = env::vars()
            .filter(|(k, _)| k.starts_with(&scope))
            .collect();
        env_vars.sort();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();

        match parts.as_slice() {
            // Logging section
            ["LOGGING", "ENABLED"] => {
                self.config.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "INCLUDE_LOCATION"] => {
                self.config.logging.include_location = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            // Metrics section
            ["METRICS", "ENABLED"] => {
                self.config.metrics.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["METRICS", "SERVICE_NAME"] => {
                self.config.metrics.service_name = value.to_string();
            }

            // Stage parameters
            ["CHAINS", chain, index, param] => {
                self.apply_param_override(key, chain, index, param, value)?;
            }

            _ => {
                tracing::debug!(var = key, "Ignoring unknown configuration override");
            }
        }

        Ok(())
    }

    fn apply_param_override(
        &mut self,
        key: &str,
        chain: &str,
        index: &str,
        param: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let stages = self
            .config
            .chains
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(chain))
            .map(|(_, chain)| chain.stages_mut())
            .ok_or_else(|| ConfigError::env_parse_error(key, format!("unknown chain {chain:?}")))?;

        let stage = index
            .parse::<usize>()
            .ok()
            .and_then(|position| stages.get_mut(position))
            .ok_or_else(|| {
                ConfigError::env_parse_error(key, format!("no stage at position {index}"))
            })?;

        let value =
            serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        stage.params = stage.params.with(param.to_lowercase(), value);
        Ok(())
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PIPE: &str = r#"
        [chains]
        pipe = [
            { filter = "gzip" },
            { filter = "checksum", params = { algo = "crc32" } },
        ]
    "#;

    fn pipe_loader() -> ConfigLoader {
        ConfigLoader::new().with_string(PIPE, "toml").unwrap()
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, ReadchainConfig::default());
    }

    #[test]
    fn test_loader_with_development() {
        let config = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_loader_with_production() {
        let config = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_loader_with_string_toml() {
        let config = pipe_loader().load().unwrap();
        let names: Vec<_> = config.chains["pipe"].filter_names().collect();
        assert_eq!(names, vec!["gzip", "checksum"]);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"chains": {"pipe": [{"filter": "limit", "params": {"bytes": 10}}]}}"#;
        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.chains["pipe"].stages()[0].params.get_int("bytes"), 10);
    }

    #[test]
    fn test_loader_with_string_unsupported_format() {
        let result = ConfigLoader::new().with_string("", "yaml");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_loader_with_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "chains.toml", PIPE);

        let loader = ConfigLoader::new().with_file(&path).unwrap();
        assert!(loader.file_loaded());
        assert_eq!(loader.load().unwrap().chains["pipe"].len(), 2);
    }

    #[test]
    fn test_loader_with_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "chains.JSON",
            r#"{"logging": {"level": "warn"}, "chains": {"b64": [{"filter": "base64"}]}}"#,
        );

        let config = ConfigLoader::new().with_file(&path).unwrap().load().unwrap();
        assert_eq!(config.logging.level, "warn");
        assert!(config.chains.contains_key("b64"));
    }

    #[test]
    fn test_loader_with_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "chains.yaml", "chains: {}");
        assert!(matches!(
            ConfigLoader::new().with_file(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_loader_file_with_unknown_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "chains.toml", "[server]\nhttp_addr = \"0.0.0.0:80\"\n");
        assert!(matches!(
            ConfigLoader::new().with_file(&path),
            Err(ConfigError::TomlError(_))
        ));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/chains.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let loader = ConfigLoader::new()
            .with_optional_file("/nonexistent/chains.toml")
            .unwrap();
        assert!(!loader.file_loaded());
        assert!(loader.load().unwrap().chains.is_empty());
    }

    #[test]
    fn test_loader_load_validates() {
        let toml = r#"
            [logging]
            level = "chatty"
        "#;
        let loader = ConfigLoader::new().with_string(toml, "toml").unwrap();
        assert!(loader.load().is_err());

        let config = ConfigLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .load_unvalidated();
        assert_eq!(config.logging.level, "chatty");
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));

        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));

        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_apply_env_var_logging() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__LOGGING__LEVEL", "debug", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__FORMAT", "Pretty", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__INCLUDE_LOCATION", "on", "TEST").unwrap();
        assert_eq!(loader.config.logging.level, "debug");
        assert_eq!(loader.config.logging.format, LogFormat::Pretty);
        assert!(loader.config.logging.include_location);
    }

    #[test]
    fn test_apply_env_var_metrics() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__METRICS__ENABLED", "false", "TEST").unwrap();
        loader.apply_env_var("TEST__METRICS__SERVICE_NAME", "ingest", "TEST").unwrap();
        assert!(!loader.config.metrics.enabled);
        assert_eq!(loader.config.metrics.service_name, "ingest");
    }

    #[test]
    fn test_apply_env_var_invalid_values() {
        let mut loader = ConfigLoader::new();
        assert!(loader.apply_env_var("TEST__METRICS__ENABLED", "maybe", "TEST").is_err());
        assert!(loader.apply_env_var("TEST__LOGGING__FORMAT", "xml", "TEST").is_err());
    }

    #[test]
    fn test_apply_env_var_unknown_key_ignored() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__SERVER__HTTP_ADDR", "0.0.0.0:80", "TEST").unwrap();
        assert_eq!(loader.config, ReadchainConfig::default());
    }

    #[test]
    fn test_apply_env_var_stage_param() {
        let mut loader = pipe_loader();
        loader.apply_env_var("TEST__CHAINS__PIPE__1__EXPECT", "3421780262", "TEST").unwrap();
        loader.apply_env_var("TEST__CHAINS__PIPE__1__ALGO", "crc32", "TEST").unwrap();
        loader.apply_env_var("TEST__CHAINS__PIPE__0__NOTE", "{\"a\": 1}", "TEST").unwrap();

        let stages = loader.config.chains["pipe"].stages();
        assert_eq!(stages[1].params.get_int("expect"), 3_421_780_262);
        assert_eq!(stages[1].params.get_string("algo"), "crc32");
        assert_eq!(stages[0].params.get("note"), Some(&serde_json::json!({"a": 1})));
    }

    #[test]
    fn test_apply_env_var_stage_param_errors() {
        let mut loader = pipe_loader();
        let err = loader
            .apply_env_var("TEST__CHAINS__OTHER__0__BYTES", "1", "TEST")
            .unwrap_err();
        assert!(err.to_string().contains("unknown chain"));

        let err = loader
            .apply_env_var("TEST__CHAINS__PIPE__2__BYTES", "1", "TEST")
            .unwrap_err();
        assert!(err.to_string().contains("no stage at position 2"));

        assert!(loader.apply_env_var("TEST__CHAINS__PIPE__X__BYTES", "1", "TEST").is_err());
    }

    #[test]
    fn test_dotenv_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "overrides.env",
            "RCLOADERTEST__LOGGING__LEVEL=warn\nRCLOADERTEST__CHAINS__PIPE__1__EXPECT=cbf43926\n",
        );

        let config = pipe_loader()
            .with_dotenv_file(&path)
            .unwrap()
            .with_env_prefix("rcloadertest")
            .load()
            .unwrap();

        assert_eq!(config.logging.level, "warn");
        assert_eq!(
            config.chains["pipe"].stages()[1].params.get_string("expect"),
            "cbf43926"
        );
    }

    #[test]
    fn test_env_prefix_needs_separator() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "boundary.env",
            concat!(
                "RCBOUNDARYTEST_HOME=/x\n",
                "RCBOUNDARYTESTLOGGING=x\n",
                "RCBOUNDARYTEST__LOGGING__LEVEL=error\n",
            ),
        );

        let config = ConfigLoader::new()
            .with_dotenv_file(&path)
            .unwrap()
            .with_env_prefix("rcboundarytest")
            .load()
            .unwrap();

        assert_eq!(config.logging.level, "error");
    }

    #[test]
    fn test_dotenv_file_missing() {
        let result = ConfigLoader::new().with_dotenv_file("/nonexistent/.env");
        assert!(matches!(result, Err(ConfigError::DotenvError { .. })));
    }
}
