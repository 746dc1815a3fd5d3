//! Chain configuration records.
//!
//! These are the already-parsed shapes the resolution engine consumes. They
//! deserialize from TOML or JSON with serde:
//!
//! ```toml
//! [chains]
//! pipe = [
//!     { filter = "gzip" },
//!     { filter = "checksum", params = { algo = "crc32" } },
//! ]
//! ```

use crate::params::Params;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One stage of a chain: a registered filter name and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageDef {
    /// Name of the filter registered with a [`ChainSet`](crate::ChainSet).
    pub filter: String,

    /// Parameters configuring the filter.
    #[serde(default, skip_serializing_if = "Params::is_empty")]
    pub params: Params,
}

impl StageDef {
    /// Creates a stage with no parameters.
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            params: Params::new(),
        }
    }

    /// Sets the stage's parameters.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}

/// An ordered list of stages.
///
/// Position 0 reads from the chain's source; the last stage is the one the
/// caller reads from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chain {
    stages: Vec<StageDef>,
}

impl Chain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    #[must_use]
    pub fn then(mut self, stage: StageDef) -> Self {
        self.stages.push(stage);
        self
    }

    /// Returns the stages in application order.
    #[must_use]
    pub fn stages(&self) -> &[StageDef] {
        &self.stages
    }

    /// Returns the filter names in application order.
    pub fn filter_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.filter.as_str())
    }

    /// Returns mutable access to the stages.
    pub fn stages_mut(&mut self) -> &mut Vec<StageDef> {
        &mut self.stages
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the chain has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl FromIterator<StageDef> for Chain {
    fn from_iter<I: IntoIterator<Item = StageDef>>(iter: I) -> Self {
        Self {
            stages: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a StageDef;
    type IntoIter = std::slice::Iter<'a, StageDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.stages.iter()
    }
}

/// A named set of chains.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    /// Chains by name.
    #[serde(default)]
    pub chains: HashMap<String, Chain>,
}

impl ChainConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the chain `name`.
    #[must_use]
    pub fn chain(mut self, name: impl Into<String>, chain: Chain) -> Self {
        self.chains.insert(name.into(), chain);
        self
    }

    /// Returns the chain `name`, if configured.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Chain> {
        self.chains.get(name)
    }
}
