//! # Readchain Core
//!
//! Configurable read-filter chains.
//!
//! A chain is a named, ordered list of stages. Each stage wraps the reader
//! produced by the previous one, so a resolved chain is an onion of
//! [`Filter`]s around the caller's source. This crate provides:
//!
//! - [`Params`] - Per-stage parameters with total typed accessors
//! - [`Filter`] and [`Root`] - The layer contract and the innermost adapter
//! - [`Registry`] and [`FilterDef`] - The catalogue of stage constructors
//! - [`ChainConfig`] - Chain definitions, deserializable from TOML or JSON
//! - [`ChainSet`] - Resolves a chain name into a composed filter
//! - [`apply`] - Walks a resolved chain from the outside in
//!
//! # Example
//!
//! ```
//! use readchain_core::{
//!     apply_filter, BoxFilter, Chain, ChainConfig, ChainSet, FilterDef, Input, Params,
//!     StageDef,
//! };
//! use std::convert::Infallible;
//! use std::io::{Cursor, Read};
//!
//! let chains = ChainSet::with_filters([FilterDef::new(
//!     "passthrough",
//!     |_: &Params, upstream: BoxFilter| Ok(upstream),
//! )])
//! .with_config(ChainConfig::new().chain(
//!     "pipe",
//!     Chain::new().then(StageDef::new("passthrough")),
//! ));
//!
//! let mut filter = chains
//!     .resolve("pipe", Some(Input::reader(Cursor::new(b"data".to_vec()))))
//!     .unwrap();
//!
//! let mut out = Vec::new();
//! filter.read_to_end(&mut out).unwrap();
//! assert_eq!(out, b"data");
//!
//! let mut depth = 0;
//! apply_filter(filter.as_ref(), |_| {
//!     depth += 1;
//!     Ok::<_, Infallible>(())
//! })
//! .unwrap();
//! assert_eq!(depth, 1);
//! ```

#![doc(html_root_url = "https://docs.rs/readchain-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod chain_set;
mod config;
mod error;
mod filter;
mod params;
mod registry;
mod traverse;

pub use chain_set::{AbortPolicy, ChainSet};
pub use config::{Chain, ChainConfig, StageDef};
pub use error::{closed, is_closed, BoxError, ChainError, ChainResult, Closed, StageError};
pub use filter::{AsAny, BoxFilter, Filter, Input, Layer, ReadClose, Resource, Root};
pub use params::Params;
pub use registry::{BoxedNewFilter, FilterDef, NewFilter, Registry};
pub use traverse::{apply, apply_filter, find, layers};
