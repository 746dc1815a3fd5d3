//! Metrics emitted by chain resolution and built-in stages.

use readchain_core::{Chain, ChainConfig, Input, StageDef};
use readchain_filters::builtin_chain_set;
use readchain_telemetry::metrics::{builder, names};
use readchain_telemetry::{MetricsConfig, MetricsRegistry};
use readchain_test::read_all;
use serde_json::json;
use std::io::Cursor;

#[test]
fn test_resolution_and_meter_metrics() {
    let config = MetricsConfig {
        enabled: true,
        service_name: "ingest".to_string(),
    };
    let recorder = builder(&config).build_recorder();
    let registry = MetricsRegistry::new(recorder.handle());

    let chains = builtin_chain_set().with_config(
        ChainConfig::new()
            .chain(
                "pipe",
                Chain::new().then(
                    StageDef::new("meter")
                        .with_params([("label", json!("raw"))].into_iter().collect()),
                ),
            )
            .chain("broken", Chain::new().then(StageDef::new("rot13"))),
    );

    metrics::with_local_recorder(&recorder, || {
        let mut filter = chains
            .resolve("pipe", Some(Input::reader(Cursor::new(b"0123456789".to_vec()))))
            .unwrap();
        assert_eq!(read_all(&mut filter).unwrap().len(), 10);
        assert!(chains.resolve("broken", None).is_err());
    });

    let output = registry.render();
    assert!(output.contains(names::RESOLUTIONS_TOTAL));
    assert!(output.contains(r#"outcome="ok""#));
    assert!(output.contains(r#"outcome="unknown_stage""#));
    assert!(output.contains(names::FILTER_BYTES_TOTAL));
    assert!(output.contains(r#"label="raw""#));
    assert!(output.contains(r#"service="ingest""#));
}
