//! Observability for readchain.
//!
//! - **Logging**: `tracing-subscriber` with an `EnvFilter` and JSON or pretty
//!   output
//! - **Metrics**: Prometheus text format via the `metrics` crate
//!
//! The library crates only emit events and metrics; this crate is what an
//! application calls once at startup to collect them.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `readchain_resolutions_total` | Counter | `chain`, `outcome` | Chain resolutions |
//! | `readchain_filter_bytes_total` | Counter | `label` | Bytes read through `meter` stages |
//!
//! # Example
//!
//! ```rust,ignore
//! use readchain_telemetry::{init_telemetry, render_metrics, TelemetryConfig};
//!
//! let config = TelemetryConfig::builder().service_name("ingest").build();
//! init_telemetry(&config)?;
//!
//! // ... resolve and read chains ...
//!
//! println!("{}", render_metrics().unwrap_or_default());
//! ```
//!
//! Rendered output:
//!
//! ```text
//! # HELP readchain_resolutions_total Total number of chain resolutions by outcome
//! # TYPE readchain_resolutions_total counter
//! readchain_resolutions_total{service="ingest",chain="pipe",outcome="ok"} 12
//! readchain_resolutions_total{service="ingest",chain="pipe",outcome="unknown_stage"} 1
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, render_metrics, MetricsConfig, MetricsRegistry};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}
