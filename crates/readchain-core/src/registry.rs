//! Catalogue of stage constructors.
//!
//! Stages are registered by name at startup. A [`FilterDef`] pairs the name
//! with a constructor, which is anything implementing [`NewFilter`]; plain
//! closures qualify.
//!
//! # Example
//!
//! ```
//! use readchain_core::{FilterDef, Registry};
//!
//! let mut registry = Registry::new();
//! registry
//!     .register(FilterDef::new("passthrough", |_params, upstream| Ok(upstream)))
//!     .unwrap();
//!
//! assert!(registry.contains("passthrough"));
//! assert!(registry
//!     .register(FilterDef::new("passthrough", |_params, upstream| Ok(upstream)))
//!     .is_err());
//! ```

use crate::error::{ChainError, ChainResult, StageError};
use crate::filter::BoxFilter;
use crate::params::Params;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Constructs a stage.
///
/// Given the stage's parameters and the filter it should read from, returns
/// the new stage. A constructor may ignore `upstream` (a stage generating its
/// own data) or reject a detached one with [`StageError::MissingUpstream`].
///
/// Implemented for every `Fn(&Params, BoxFilter) -> Result<BoxFilter, StageError>`.
pub trait NewFilter: Send + Sync + 'static {
    /// Builds the stage on top of `upstream`.
    fn new_filter(&self, params: &Params, upstream: BoxFilter) -> Result<BoxFilter, StageError>;
}

impl<F> NewFilter for F
where
    F: Fn(&Params, BoxFilter) -> Result<BoxFilter, StageError> + Send + Sync + 'static,
{
    fn new_filter(&self, params: &Params, upstream: BoxFilter) -> Result<BoxFilter, StageError> {
        self(params, upstream)
    }
}

/// A shared, type-erased constructor.
pub type BoxedNewFilter = Arc<dyn NewFilter>;

/// A filter to be registered: a name and its constructor.
#[derive(Clone)]
pub struct FilterDef {
    name: String,
    new: BoxedNewFilter,
}

impl FilterDef {
    /// Pairs `name` with a constructor function.
    pub fn new<F>(name: impl Into<String>, new: F) -> Self
    where
        F: Fn(&Params, BoxFilter) -> Result<BoxFilter, StageError> + Send + Sync + 'static,
    {
        Self::from_constructor(name, new)
    }

    /// Pairs `name` with any [`NewFilter`] implementation.
    pub fn from_constructor(name: impl Into<String>, new: impl NewFilter) -> Self {
        Self {
            name: name.into(),
            new: Arc::new(new),
        }
    }

    /// Returns the registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the constructor.
    #[must_use]
    pub fn constructor(&self) -> &BoxedNewFilter {
        &self.new
    }
}

impl fmt::Debug for FilterDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterDef").field("name", &self.name).finish()
    }
}

/// Maps filter names to constructors.
///
/// Names are unique for the lifetime of the registry: a second registration
/// under an existing name is rejected and the first one is kept.
#[derive(Clone, Default)]
pub struct Registry {
    filters: HashMap<String, BoxedNewFilter>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a filter.
    ///
    /// Returns [`ChainError::DuplicateRegistration`] if the name is taken.
    pub fn register(&mut self, filter: FilterDef) -> ChainResult<()> {
        if self.filters.contains_key(&filter.name) {
            return Err(ChainError::DuplicateRegistration { name: filter.name });
        }
        tracing::trace!(filter = %filter.name, "Registered filter");
        self.filters.insert(filter.name, filter.new);
        Ok(())
    }

    /// Registers a filter, panicking if registration fails.
    ///
    /// Filter catalogues are fixed at startup; a duplicate name is a
    /// programming error.
    pub fn must_register(&mut self, filter: FilterDef) {
        if let Err(err) = self.register(filter) {
            panic!("{err}");
        }
    }

    /// Returns the constructor registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoxedNewFilter> {
        self.filters.get(name)
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Returns the registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("filters", &self.names())
            .finish()
    }
}

impl FromIterator<FilterDef> for Registry {
    /// Builds a registry from a batch, panicking on a duplicate name.
    fn from_iter<I: IntoIterator<Item = FilterDef>>(iter: I) -> Self {
        let mut registry = Self::new();
        for filter in iter {
            registry.must_register(filter);
        }
        registry
    }
}
