//! # readchain
//!
//! **Configurable read-filter chains**
//!
//! readchain turns a declarative list of stages into a live reader. Each
//! stage wraps the one before it, so the caller reads decoded bytes from the
//! outermost layer and can walk back down to inspect any layer beneath it.
//!
//! - **Registry** of named stage constructors, with the built-in gzip, zlib,
//!   deflate, brotli, base64, checksum, limit and meter stages
//! - **Resolution** of a named chain over a source, with errors that point at
//!   the failing chain position
//! - **Traversal** of a resolved chain from the outermost layer down
//! - **Configuration** from TOML/JSON files and environment overrides
//! - **Telemetry** through `tracing` and a Prometheus metrics recorder
//!
//! ## Quick Start
//!
//! ```
//! use readchain::prelude::*;
//! use std::io::{Cursor, Read};
//!
//! let toml = r#"
//!     [chains]
//!     plain = [{ filter = "limit", params = { bytes = 5 } }]
//! "#;
//! let config = ConfigLoader::new().with_string(toml, "toml").unwrap().load().unwrap();
//!
//! let chains = readchain::chain_set(&config).unwrap();
//! let mut filter = chains
//!     .resolve("plain", Some(Input::reader(Cursor::new(b"hello, world".to_vec()))))
//!     .unwrap();
//!
//! let mut out = String::new();
//! filter.read_to_string(&mut out).unwrap();
//! assert_eq!(out, "hello");
//! ```
//!
//! ## Architecture
//!
//! ```text
//! caller reads ← stage N ← ... ← stage 0 ← root ← source
//! ```

#![doc(html_root_url = "https://docs.rs/readchain/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use readchain_config::ReadchainConfig;
use readchain_core::ChainSet;
use thiserror::Error;

// Re-export the resolution engine
pub use readchain_core as core;

// Re-export configuration loading
pub use readchain_config as config;

// Re-export built-in stages
pub use readchain_filters as filters;

// Re-export logging and metrics setup
pub use readchain_telemetry as telemetry;

/// Errors from setting up chains and telemetry together.
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration could not be applied.
    #[error(transparent)]
    Config(#[from] readchain_config::ConfigError),

    /// Logging or metrics could not be initialized.
    #[error(transparent)]
    Telemetry(#[from] readchain_telemetry::TelemetryError),
}

/// Returns a chain set with the built-in stages and the chains of `config`.
///
/// # Errors
///
/// Returns [`Error::Config`] if a chain names an unregistered filter.
pub fn chain_set(config: &ReadchainConfig) -> Result<ChainSet, Error> {
    Ok(config.configure(readchain_filters::builtin_chain_set())?)
}

/// Installs logging and metrics from `config`, then builds its chain set.
///
/// Call once at startup; the subscriber and recorder are process-global.
///
/// # Errors
///
/// Returns [`Error::Telemetry`] if a subscriber or recorder is already
/// installed, or [`Error::Config`] as [`chain_set`] does.
pub fn init(config: &ReadchainConfig) -> Result<ChainSet, Error> {
    readchain_telemetry::init_telemetry(&config.telemetry_config())?;
    chain_set(config)
}

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use readchain::prelude::*;
/// ```
pub mod prelude {
    pub use readchain_core::{
        apply, apply_filter, find, layers, AbortPolicy, BoxFilter, Chain, ChainConfig, ChainError,
        ChainResult, ChainSet, Filter, FilterDef, Input, Layer, Params, ReadClose, Root,
        StageDef, StageError,
    };

    // Configuration
    pub use readchain_config::{ConfigError, ConfigLoader, ReadchainConfig};

    // Built-in stages
    pub use readchain_filters::{builtin_chain_set, builtin_filters, Checksum, Limit, Meter};
}
