//! # Readchain Test
//!
//! Test utilities for readchain, for exercising chains without files or
//! network resources.
//!
//! ## Key Features
//!
//! - **In-Memory Sources**: [`MemorySource`] reports when it is closed
//! - **Recording Stages**: [`tag_filter`] builds pass-through stages that log
//!   their closes into a shared [`CloseLog`]
//! - **Failing Stages**: [`failing_filter`] always fails construction
//! - **Fixtures**: compressed and checksummed payloads in [`fixtures`]
//!
//! ## Example
//!
//! ```
//! use readchain_core::{Chain, ChainConfig, ChainSet, Input, ReadClose, StageDef};
//! use readchain_test::{layer_names, read_all, tag_filter, CloseLog, MemorySource};
//!
//! let log = CloseLog::new();
//! let chains = ChainSet::with_filters([tag_filter("a", &log), tag_filter("b", &log)])
//!     .with_config(ChainConfig::new().chain(
//!         "pipe",
//!         Chain::new().then(StageDef::new("a")).then(StageDef::new("b")),
//!     ));
//!
//! let source = MemorySource::new(b"payload".to_vec(), &log);
//! let mut filter = chains.resolve("pipe", Some(Input::resource(source))).unwrap();
//!
//! assert_eq!(layer_names(filter.as_ref()), vec!["b", "a", "root"]);
//! assert_eq!(read_all(&mut filter).unwrap(), b"payload");
//!
//! filter.close().unwrap();
//! assert_eq!(log.entries(), vec!["b", "a", "source"]);
//! ```

#![doc(html_root_url = "https://docs.rs/readchain-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod fixtures;
mod source;
mod stages;

pub use error::TestError;
pub use source::{CloseLog, MemorySource};
pub use stages::{failing_filter, layer_names, read_all, tag_filter, TagFilter};
