//! Prometheus metrics for readchain.
//!
//! Library crates record through the `metrics` facade; nothing is collected
//! until a recorder is installed. [`init_metrics`] installs a Prometheus
//! recorder whose output is rendered on demand with
//! [`MetricsRegistry::render`]. No HTTP listener is started.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `readchain_resolutions_total` | Counter | `chain`, `outcome` | Chain resolutions |
//! | `readchain_filter_bytes_total` | Counter | `label` | Bytes read through `meter` stages |

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metric names.
pub mod names {
    /// Chain resolutions, by chain and outcome.
    pub const RESOLUTIONS_TOTAL: &str = "readchain_resolutions_total";

    /// Bytes read through `meter` stages, by label.
    pub const FILTER_BYTES_TOTAL: &str = "readchain_filter_bytes_total";
}

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Service name, attached to every metric as the `service` label.
    pub service_name: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: "readchain".to_string(),
        }
    }
}

/// Renders collected metrics.
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    handle: PrometheusHandle,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with the given handle.
    #[must_use]
    pub fn new(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Returns the registry of the globally installed recorder, if any.
    #[must_use]
    pub fn global() -> Option<Self> {
        METRICS_HANDLE.get().cloned().map(Self::new)
    }

    /// Renders all metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initializes the metrics subsystem.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let handle = builder(config)
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);

    register_metric_descriptions();

    Ok(())
}

/// Returns a Prometheus builder configured from `config`.
///
/// Useful for building a local recorder in tests.
#[must_use]
pub fn builder(config: &MetricsConfig) -> PrometheusBuilder {
    PrometheusBuilder::new().add_global_label("service", config.service_name.clone())
}

/// Renders metrics in Prometheus format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

/// Registers descriptions for all standard metrics.
pub fn register_metric_descriptions() {
    describe_counter!(
        names::RESOLUTIONS_TOTAL,
        "Total number of chain resolutions by outcome"
    );

    describe_counter!(
        names::FILTER_BYTES_TOTAL,
        "Total bytes read through meter stages"
    );
}
