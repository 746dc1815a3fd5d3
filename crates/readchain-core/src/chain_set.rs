//! Chain resolution.
//!
//! A [`ChainSet`] holds the filter [`Registry`] and the active
//! [`ChainConfig`]. [`ChainSet::resolve`] turns a chain name into a single
//! composed [`Filter`](crate::Filter) by folding the chain's stages over the initial
//! source, each constructor wrapping the result of the previous one.
//!
//! # Lifecycle
//!
//! Populate first (register filters, configure chains), then resolve.
//! Registration and configuration take `&mut self`; resolution takes `&self`,
//! so a shared `ChainSet` is frozen.
//!
//! # Example
//!
//! ```
//! use readchain_core::{Chain, ChainConfig, ChainSet, FilterDef, Input, StageDef};
//! use std::io::{Cursor, Read};
//!
//! let chains = ChainSet::with_filters([
//!     FilterDef::new("passthrough", |_params, upstream| Ok(upstream)),
//! ])
//! .with_config(ChainConfig::new().chain(
//!     "pipe",
//!     Chain::new().then(StageDef::new("passthrough")),
//! ));
//!
//! let mut filter = chains
//!     .resolve("pipe", Some(Input::reader(Cursor::new(b"hello".to_vec()))))
//!     .unwrap();
//!
//! let mut out = String::new();
//! filter.read_to_string(&mut out).unwrap();
//! assert_eq!(out, "hello");
//! ```

use crate::config::ChainConfig;
use crate::error::{ChainError, ChainResult};
use crate::filter::{BoxFilter, Input, Root};
use crate::registry::{FilterDef, Registry};
use metrics::counter;
use tracing::{debug, warn};

/// What to do with a partially built chain when a stage names an
/// unregistered filter.
///
/// The policy covers only chains the engine still holds. A constructor is
/// handed the running chain by value, so once it fails the chain is its to
/// release: it may close `upstream` before returning the error, otherwise
/// the chain is dropped unclosed under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AbortPolicy {
    /// Drop the stages built so far without closing them.
    #[default]
    Drop,
    /// Close the outermost stage built so far, which closes the layers
    /// beneath it, then drop it.
    Close,
}

/// Filters and the chains composed of them.
#[derive(Debug, Clone, Default)]
pub struct ChainSet {
    registry: Registry,
    config: ChainConfig,
    abort_policy: AbortPolicy,
}

impl ChainSet {
    /// Creates an empty chain set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a chain set registered with `filters`.
    ///
    /// # Panics
    ///
    /// Panics if two filters share a name.
    #[must_use]
    pub fn with_filters(filters: impl IntoIterator<Item = FilterDef>) -> Self {
        Self {
            registry: filters.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Registers a filter.
    ///
    /// Returns [`ChainError::DuplicateRegistration`] if the name is taken.
    pub fn register(&mut self, filter: FilterDef) -> ChainResult<()> {
        self.registry.register(filter)
    }

    /// Registers a filter, panicking if registration fails.
    pub fn must_register(&mut self, filter: FilterDef) {
        self.registry.must_register(filter);
    }

    /// Replaces the configuration.
    ///
    /// The previous configuration is discarded, not merged. Names are not
    /// checked here; a stage naming an unknown filter, the empty name
    /// included, fails at resolution.
    pub fn configure(&mut self, config: ChainConfig) {
        debug!(chains = config.chains.len(), "Configured chain set");
        self.config = config;
    }

    /// Replaces the configuration and returns the chain set.
    #[must_use]
    pub fn with_config(mut self, config: ChainConfig) -> Self {
        self.configure(config);
        self
    }

    /// Sets the policy applied to partially built chains on failure.
    #[must_use]
    pub fn with_abort_policy(mut self, policy: AbortPolicy) -> Self {
        self.abort_policy = policy;
        self
    }

    /// Returns the filter registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Returns the configured chain names, sorted.
    #[must_use]
    pub fn chain_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.config.chains.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolves the chain `chain` into a single filter.
    ///
    /// The first stage reads from `src`: an [`Input::Filter`] is used as is
    /// (its own layers stay reachable by traversal), an
    /// [`Input::Resource`] is wrapped in a [`Root`], and `None` starts from a
    /// [detached](Root::detached) root.
    ///
    /// # Errors
    ///
    /// - [`ChainError::UnknownChain`] if `chain` is not configured
    /// - [`ChainError::UnknownStage`] if a stage names an unregistered filter
    /// - [`ChainError::StageConstruction`] if a constructor fails
    ///
    /// No partial chain is returned. On an unknown stage, the stages already
    /// built are handled per the [`AbortPolicy`]. A failing constructor owns
    /// its upstream and decides whether to close it.
    pub fn resolve(&self, chain: &str, src: Option<Input>) -> ChainResult<BoxFilter> {
        let result = self.fold(chain, src);
        let outcome = match &result {
            Ok(_) => "ok",
            Err(ChainError::UnknownChain { .. }) => "unknown_chain",
            Err(ChainError::UnknownStage { .. }) => "unknown_stage",
            Err(_) => "stage_error",
        };
        counter!("readchain_resolutions_total", "chain" => chain.to_string(), "outcome" => outcome)
            .increment(1);
        if let Err(err) = &result {
            warn!(chain, error = %err, "Chain resolution failed");
        }
        result
    }

    fn fold(&self, chain: &str, src: Option<Input>) -> ChainResult<BoxFilter> {
        let stages = self
            .config
            .get(chain)
            .ok_or_else(|| ChainError::UnknownChain {
                chain: chain.to_string(),
            })?;

        let mut filter = src.map_or_else(
            || Box::new(Root::detached()) as BoxFilter,
            Input::into_filter,
        );

        for (position, stage) in stages.into_iter().enumerate() {
            let Some(new_filter) = self.registry.get(&stage.filter) else {
                self.abort(filter, chain, position);
                return Err(ChainError::UnknownStage {
                    chain: chain.to_string(),
                    position,
                    filter: stage.filter.clone(),
                });
            };
            // On failure the running filter belongs to the constructor.
            filter = new_filter
                .new_filter(&stage.params, filter)
                .map_err(|source| ChainError::StageConstruction {
                    chain: chain.to_string(),
                    position,
                    filter: stage.filter.clone(),
                    source,
                })?;
            debug!(chain, position, filter = %stage.filter, "Constructed stage");
        }

        Ok(filter)
    }

    fn abort(&self, mut partial: BoxFilter, chain: &str, position: usize) {
        if self.abort_policy == AbortPolicy::Close {
            if let Err(err) = partial.close() {
                warn!(chain, position, error = %err, "Failed to close partial chain");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Chain, StageDef};
    use crate::error::StageError;
    use crate::filter::{Filter, Layer, ReadClose, Resource};
    use crate::params::Params;
    use crate::traverse::layers;
    use serde_json::json;
    use std::io::{self, Cursor, Read};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Appends a fixed suffix to the stream and counts closes.
    struct Suffix {
        name: String,
        suffix: Vec<u8>,
        emitted: usize,
        inner: BoxFilter,
        closes: Arc<AtomicUsize>,
    }

    impl Read for Suffix {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.inner.read(buf)?;
            if n > 0 || buf.is_empty() {
                return Ok(n);
            }
            let rest = &self.suffix[self.emitted..];
            let n = rest.len().min(buf.len());
            buf[..n].copy_from_slice(&rest[..n]);
            self.emitted += n;
            Ok(n)
        }
    }

    impl ReadClose for Suffix {
        fn close(&mut self) -> io::Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            self.inner.close()
        }
    }

    impl Filter for Suffix {
        fn name(&self) -> &str {
            &self.name
        }

        fn source(&self) -> Option<Layer<'_>> {
            Some(Layer::Filter(&*self.inner))
        }
    }

    fn suffix_filter(name: &'static str, closes: Arc<AtomicUsize>) -> FilterDef {
        FilterDef::new(name, move |params: &Params, upstream: BoxFilter| {
            Ok(Box::new(Suffix {
                name: name.to_string(),
                suffix: params.get_string("text").into_bytes(),
                emitted: 0,
                inner: upstream,
                closes: closes.clone(),
            }) as BoxFilter)
        })
    }

    fn stage(filter: &str, text: &str) -> StageDef {
        StageDef::new(filter).with_params(Params::from_iter([("text", json!(text))]))
    }

    fn layer_names(filter: &dyn Filter) -> Vec<&str> {
        layers(filter).map(|layer| layer.name().unwrap_or("resource")).collect()
    }

    fn read_all(filter: &mut BoxFilter) -> String {
        let mut out = String::new();
        filter.read_to_string(&mut out).unwrap();
        out
    }

    fn chain_set(closes: &Arc<AtomicUsize>) -> ChainSet {
        ChainSet::with_filters([
            suffix_filter("a", closes.clone()),
            suffix_filter("b", closes.clone()),
        ])
    }

    #[test]
    fn test_resolve_applies_stages_in_order() {
        let closes = Arc::new(AtomicUsize::new(0));
        let chains = chain_set(&closes).with_config(ChainConfig::new().chain(
            "pipe",
            Chain::new().then(stage("a", "1")).then(stage("b", "2")),
        ));

        let mut filter = chains
            .resolve("pipe", Some(Input::reader(Cursor::new(b"x".to_vec()))))
            .unwrap();
        assert_eq!(read_all(&mut filter), "x12");
        assert_eq!(layer_names(filter.as_ref()), vec!["b", "a", "root"]);
    }

    #[test]
    fn test_same_filter_at_two_positions() {
        let closes = Arc::new(AtomicUsize::new(0));
        let chains = chain_set(&closes).with_config(ChainConfig::new().chain(
            "pipe",
            Chain::new().then(stage("a", "1")).then(stage("a", "2")),
        ));
        let mut filter = chains.resolve("pipe", None).unwrap();
        assert_eq!(read_all(&mut filter), "12");
    }

    #[test]
    fn test_resolve_without_source_uses_detached_root() {
        let closes = Arc::new(AtomicUsize::new(0));
        let chains = chain_set(&closes)
            .with_config(ChainConfig::new().chain("pipe", Chain::new()));
        let filter = chains.resolve("pipe", None).unwrap();
        assert_eq!(filter.name(), "root");
        assert!(filter.is_detached());
    }

    #[test]
    fn test_resolve_keeps_input_filter() {
        let closes = Arc::new(AtomicUsize::new(0));
        let chains = chain_set(&closes).with_config(
            ChainConfig::new()
                .chain("inner", Chain::new().then(stage("a", "1")))
                .chain("outer", Chain::new().then(stage("b", "2"))),
        );

        let inner = chains
            .resolve("inner", Some(Input::reader(Cursor::new(b"x".to_vec()))))
            .unwrap();
        let mut outer = chains.resolve("outer", Some(Input::Filter(inner))).unwrap();
        assert_eq!(layer_names(outer.as_ref()), vec!["b", "a", "root"]);
        assert_eq!(read_all(&mut outer), "x12");
    }

    #[test]
    fn test_unknown_chain() {
        let chains = ChainSet::new();
        let err = chains.resolve("missing", None).unwrap_err();
        assert!(matches!(err, ChainError::UnknownChain { ref chain } if chain == "missing"));
    }

    #[test]
    fn test_unknown_stage_reports_position() {
        let closes = Arc::new(AtomicUsize::new(0));
        let chains = chain_set(&closes).with_config(ChainConfig::new().chain(
            "pipe",
            Chain::new().then(stage("a", "1")).then(StageDef::new("rot13")),
        ));

        let err = chains.resolve("pipe", None).unwrap_err();
        assert_eq!(err.to_string(), r#"pipe[1]: unknown filter "rot13""#);
        assert_eq!(err.position(), Some(1));
        // Default policy leaves the stage built at position 0 unclosed
        assert_eq!(closes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_abort_policy_close() {
        let closes = Arc::new(AtomicUsize::new(0));
        let chains = chain_set(&closes)
            .with_abort_policy(AbortPolicy::Close)
            .with_config(ChainConfig::new().chain(
                "pipe",
                Chain::new()
                    .then(stage("a", "1"))
                    .then(stage("b", "2"))
                    .then(StageDef::new("rot13")),
            ));

        let resource = Resource::new(Cursor::new(Vec::new()));
        assert!(chains.resolve("pipe", Some(Input::resource(resource))).is_err());
        // Closing "b" cascades to "a"
        assert_eq!(closes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stage_construction_failure_is_attributed() {
        let mut chains = ChainSet::new();
        chains
            .register(FilterDef::new("needs_input", |_: &Params, upstream: BoxFilter| {
                if upstream.is_detached() {
                    return Err(StageError::MissingUpstream);
                }
                Ok(upstream)
            }))
            .unwrap();
        chains.configure(
            ChainConfig::new().chain("pipe", Chain::new().then(StageDef::new("needs_input"))),
        );

        let err = chains.resolve("pipe", None).unwrap_err();
        assert_eq!(err.to_string(), "pipe[0]needs_input: missing upstream source");
        assert_eq!(err.chain(), Some("pipe"));
        assert_eq!(err.filter(), Some("needs_input"));
        assert!(matches!(
            err,
            ChainError::StageConstruction {
                source: StageError::MissingUpstream,
                ..
            }
        ));
    }

    #[test]
    fn test_failed_constructor_owns_upstream() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut chains = chain_set(&closes).with_abort_policy(AbortPolicy::Close);
        chains
            .register(FilterDef::new("broken", |_: &Params, _upstream: BoxFilter| {
                Err(StageError::invalid_param("mode", "unsupported"))
            }))
            .unwrap();
        chains
            .register(FilterDef::new("tidy", |_: &Params, mut upstream: BoxFilter| {
                upstream.close()?;
                Err(StageError::invalid_param("mode", "unsupported"))
            }))
            .unwrap();
        chains.configure(
            ChainConfig::new()
                .chain("leaky", Chain::new().then(stage("a", "1")).then(StageDef::new("broken")))
                .chain("tidy", Chain::new().then(stage("a", "1")).then(StageDef::new("tidy"))),
        );

        // The policy does not reach a chain already handed to a constructor
        let err = chains.resolve("leaky", None).unwrap_err();
        assert!(matches!(err, ChainError::StageConstruction { position: 1, .. }));
        assert_eq!(closes.load(Ordering::SeqCst), 0);

        let err = chains.resolve("tidy", None).unwrap_err();
        assert!(matches!(err, ChainError::StageConstruction { position: 1, .. }));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_configure_replaces_previous() {
        let mut chains = ChainSet::new();
        chains.configure(ChainConfig::new().chain("one", Chain::new()));
        chains.configure(ChainConfig::new().chain("two", Chain::new()));
        assert_eq!(chains.chain_names(), vec!["two"]);
        assert!(chains.resolve("one", None).is_err());
    }

    #[test]
    fn test_empty_filter_name_fails_at_resolution() {
        let closes = Arc::new(AtomicUsize::new(0));
        let chains = chain_set(&closes).with_config(
            ChainConfig::new()
                .chain("pipe", Chain::new().then(stage("a", "1")).then(StageDef::new("")))
                .chain("ok", Chain::new().then(stage("a", "1"))),
        );

        let err = chains.resolve("pipe", None).unwrap_err();
        assert_eq!(err.to_string(), r#"pipe[1]: unknown filter """#);
        assert_eq!(err.position(), Some(1));
        // Other chains stay usable
        let mut filter = chains.resolve("ok", None).unwrap();
        assert_eq!(read_all(&mut filter), "1");
    }

    #[test]
    fn test_chain_set_is_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        fn assert_send<T: Send>() {}

        assert_send_sync::<ChainSet>();
        assert_send_sync::<Registry>();
        assert_send_sync::<FilterDef>();
        assert_send::<BoxFilter>();
        assert_send::<Input>();
    }

    #[test]
    fn test_concurrent_resolve() {
        let closes = Arc::new(AtomicUsize::new(0));
        let chains = chain_set(&closes).with_config(ChainConfig::new().chain(
            "pipe",
            Chain::new().then(stage("a", "1")).then(stage("b", "2")),
        ));

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let chains = &chains;
                    scope.spawn(move || {
                        let input = Input::reader(Cursor::new(i.to_string().into_bytes()));
                        let mut filter = chains.resolve("pipe", Some(input)).unwrap();
                        read_all(&mut filter)
                    })
                })
                .collect();
            for (i, handle) in handles.into_iter().enumerate() {
                assert_eq!(handle.join().unwrap(), format!("{i}12"));
            }
        });
    }

    #[test]
    fn test_resolve_twice_gives_independent_chains() {
        let closes = Arc::new(AtomicUsize::new(0));
        let chains = chain_set(&closes).with_config(ChainConfig::new().chain(
            "pipe",
            Chain::new().then(stage("a", "1")).then(stage("b", "2")),
        ));

        let mut first = chains
            .resolve("pipe", Some(Input::reader(Cursor::new(b"x".to_vec()))))
            .unwrap();
        let mut second = chains
            .resolve("pipe", Some(Input::reader(Cursor::new(b"x".to_vec()))))
            .unwrap();

        assert_eq!(layer_names(first.as_ref()), layer_names(second.as_ref()));
        // Reading one does not advance the other
        assert_eq!(read_all(&mut first), "x12");
        assert_eq!(read_all(&mut second), "x12");
    }
}
