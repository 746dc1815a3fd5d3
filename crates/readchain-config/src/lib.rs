//! Layered configuration for readchain.
//!
//! This crate loads the chain table, together with logging and metrics
//! settings, with support for:
//! - TOML and JSON configuration files or strings
//! - `.env` files
//! - Environment variable overrides, down to a single stage parameter
//! - Strict validation (fails on unknown fields)
//!
//! # Example
//!
//! ```no_run
//! use readchain_config::{ConfigLoader, ReadchainConfig};
//! use readchain_core::ChainSet;
//!
//! # fn main() -> Result<(), readchain_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("chains.toml")?
//!     .with_env_prefix("READCHAIN")
//!     .load()?;
//!
//! let chains = config.configure(ChainSet::new())?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! service_name = "ingest"
//!
//! [chains]
//! pipe = [
//!     { filter = "gzip" },
//!     { filter = "checksum", params = { algo = "crc32", expect = "cbf43926" } },
//! ]
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden via environment variables using the format
//! `PREFIX__SECTION__KEY`. For example:
//!
//! - `READCHAIN__LOGGING__LEVEL=debug`
//! - `READCHAIN__LOGGING__FORMAT=pretty`
//! - `READCHAIN__METRICS__ENABLED=false`
//! - `READCHAIN__CHAINS__PIPE__1__EXPECT=0`

#![doc(html_root_url = "https://docs.rs/readchain-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{ReadchainConfig, ReadchainConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LogFormat, LoggingSection, MetricsSection};
