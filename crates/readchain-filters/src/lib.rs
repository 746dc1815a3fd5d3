//! # Readchain Filters
//!
//! Built-in stages for readchain chains.
//!
//! ```text
//! File → Root → gzip → checksum → caller
//! ```
//!
//! | Stage      | Params                              |
//! |------------|-------------------------------------|
//! | `gzip`     | -                                   |
//! | `zlib`     | -                                   |
//! | `deflate`  | -                                   |
//! | `brotli`   | `buffer_size` (4096, max 1 MiB)     |
//! | `base64`   | `alphabet`: `standard` or `url`     |
//! | `checksum` | `algo`: `crc32`; `expect`           |
//! | `limit`    | `bytes`                             |
//! | `meter`    | `label` (default `meter`)           |
//!
//! Decoding stages need a real source and fail construction over a detached
//! root. All stages close their upstream when closed and report
//! [`closed`](readchain_core::closed) when read afterwards.
//!
//! ## Example
//!
//! ```
//! use readchain_core::{find, ChainConfig, Input};
//! use readchain_filters::{builtin_chain_set, Checksum};
//! use std::io::Read;
//!
//! let config: ChainConfig = serde_json::from_str(
//!     r#"{"chains": {"pipe": [{"filter": "checksum", "params": {"algo": "crc32"}}]}}"#,
//! )
//! .unwrap();
//! let chains = builtin_chain_set().with_config(config);
//!
//! let mut filter = chains
//!     .resolve("pipe", Some(Input::reader(std::io::Cursor::new(b"123456789".to_vec()))))
//!     .unwrap();
//! std::io::copy(&mut filter, &mut std::io::sink()).unwrap();
//!
//! let checksum = find::<Checksum>(filter.as_ref()).unwrap();
//! assert_eq!(checksum.sum(), 0xCBF4_3926);
//! ```

#![doc(html_root_url = "https://docs.rs/readchain-filters/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod stages;

pub use stages::checksum::checksum;
pub use stages::compression::{brotli, deflate, gzip, zlib};
pub use stages::encoding::base64;
pub use stages::limit::limit;
pub use stages::meter::meter;
pub use stages::{
    Base64, Brotli, Checksum, ChecksumMismatch, Decode, Decoder, Deflate, Gzip, Limit, Meter, Zlib,
};

use readchain_core::{ChainSet, FilterDef};

/// Returns the registrations of every built-in stage.
pub fn builtin_filters() -> Vec<FilterDef> {
    vec![
        gzip(),
        zlib(),
        deflate(),
        brotli(),
        base64(),
        checksum(),
        limit(),
        meter(),
    ]
}

/// Returns a chain set with every built-in stage registered and no chains
/// configured.
pub fn builtin_chain_set() -> ChainSet {
    ChainSet::with_filters(builtin_filters())
}
