//! Decompression stages.
//!
//! Each stage decodes the bytes of its upstream with a streaming decoder:
//!
//! | Stage     | Format                                   | Params        |
//! |-----------|------------------------------------------|---------------|
//! | `gzip`    | gzip (RFC 1952), concatenated members    | -             |
//! | `zlib`    | zlib (RFC 1950)                          | -             |
//! | `deflate` | raw deflate (RFC 1951)                   | -             |
//! | `brotli`  | brotli (RFC 7932)                        | `buffer_size` |
//!
//! The stages share one [`Filter`] implementation, [`Decode`], generic over
//! the [`Decoder`] that does the work. A decoder owns the upstream filter;
//! [`Decode`] reaches through it for traversal and close.
//!
//! ## Example
//!
//! ```
//! use readchain_core::{Chain, ChainConfig, Input, StageDef};
//! use readchain_filters::builtin_chain_set;
//! use std::io::{Read, Write};
//!
//! let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
//! encoder.write_all(b"compressed text").unwrap();
//! let compressed = encoder.finish().unwrap();
//!
//! let unzip = Chain::new().then(StageDef::new("gzip"));
//! let chains = builtin_chain_set().with_config(ChainConfig::new().chain("unzip", unzip));
//!
//! let mut filter = chains
//!     .resolve("unzip", Some(Input::reader(std::io::Cursor::new(compressed))))
//!     .unwrap();
//! let mut out = String::new();
//! filter.read_to_string(&mut out).unwrap();
//! assert_eq!(out, "compressed text");
//! ```

use flate2::read::{DeflateDecoder, MultiGzDecoder, ZlibDecoder};
use readchain_core::{
    closed, BoxFilter, Filter, FilterDef, Layer, Params, ReadClose, StageError,
};
use std::io::{self, Read};

/// Default internal buffer size of the brotli stage.
pub const DEFAULT_BROTLI_BUFFER_SIZE: usize = 4096;

/// Largest accepted `buffer_size` for the `brotli` stage (1 MiB).
pub const MAX_BROTLI_BUFFER_SIZE: usize = 1 << 20;

/// A streaming decoder that owns the filter it reads from.
pub trait Decoder: Read + Send + Sized + 'static {
    /// The stage name the decoder is registered under.
    const NAME: &'static str;

    /// Builds the decoder over `upstream`.
    fn wrap(upstream: BoxFilter, params: &Params) -> Result<Self, StageError>;

    /// Returns the upstream filter.
    fn upstream(&self) -> &BoxFilter;

    /// Returns the upstream filter mutably.
    fn upstream_mut(&mut self) -> &mut BoxFilter;
}

/// A stage that decodes its upstream with `D`.
pub struct Decode<D> {
    decoder: D,
    closed: bool,
}

/// The `gzip` stage.
pub type Gzip = Decode<MultiGzDecoder<BoxFilter>>;
/// The `zlib` stage.
pub type Zlib = Decode<ZlibDecoder<BoxFilter>>;
/// The `deflate` stage.
pub type Deflate = Decode<DeflateDecoder<BoxFilter>>;
/// The `brotli` stage.
pub type Brotli = Decode<brotli::Decompressor<BoxFilter>>;

impl<D: Decoder> Decode<D> {
    /// Builds the stage over `upstream`.
    ///
    /// Fails with [`StageError::MissingUpstream`] if `upstream` is detached.
    pub fn new(upstream: BoxFilter, params: &Params) -> Result<Self, StageError> {
        if upstream.is_detached() {
            return Err(StageError::MissingUpstream);
        }
        Ok(Self {
            decoder: D::wrap(upstream, params)?,
            closed: false,
        })
    }

    /// Returns the registration for this stage.
    pub fn filter_def() -> FilterDef {
        FilterDef::new(D::NAME, |params: &Params, upstream: BoxFilter| {
            Ok(Box::new(Self::new(upstream, params)?) as BoxFilter)
        })
    }

    /// Returns the decoder.
    pub fn decoder(&self) -> &D {
        &self.decoder
    }
}

impl<D: Decoder> Read for Decode<D> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.closed {
            return Err(closed());
        }
        self.decoder.read(buf)
    }
}

impl<D: Decoder> ReadClose for Decode<D> {
    fn close(&mut self) -> io::Result<()> {
        if std::mem::replace(&mut self.closed, true) {
            return Ok(());
        }
        self.decoder.upstream_mut().close()
    }
}

impl<D: Decoder> Filter for Decode<D> {
    fn name(&self) -> &str {
        D::NAME
    }

    fn source(&self) -> Option<Layer<'_>> {
        Some(Layer::Filter(&**self.decoder.upstream()))
    }
}

impl Decoder for MultiGzDecoder<BoxFilter> {
    const NAME: &'static str = "gzip";

    fn wrap(upstream: BoxFilter, _params: &Params) -> Result<Self, StageError> {
        Ok(Self::new(upstream))
    }

    fn upstream(&self) -> &BoxFilter {
        self.get_ref()
    }

    fn upstream_mut(&mut self) -> &mut BoxFilter {
        self.get_mut()
    }
}

impl Decoder for ZlibDecoder<BoxFilter> {
    const NAME: &'static str = "zlib";

    fn wrap(upstream: BoxFilter, _params: &Params) -> Result<Self, StageError> {
        Ok(Self::new(upstream))
    }

    fn upstream(&self) -> &BoxFilter {
        self.get_ref()
    }

    fn upstream_mut(&mut self) -> &mut BoxFilter {
        self.get_mut()
    }
}

impl Decoder for DeflateDecoder<BoxFilter> {
    const NAME: &'static str = "deflate";

    fn wrap(upstream: BoxFilter, _params: &Params) -> Result<Self, StageError> {
        Ok(Self::new(upstream))
    }

    fn upstream(&self) -> &BoxFilter {
        self.get_ref()
    }

    fn upstream_mut(&mut self) -> &mut BoxFilter {
        self.get_mut()
    }
}

impl Decoder for brotli::Decompressor<BoxFilter> {
    const NAME: &'static str = "brotli";

    fn wrap(upstream: BoxFilter, params: &Params) -> Result<Self, StageError> {
        let buffer_size = if params.contains_key("buffer_size") {
            usize::try_from(params.get_int("buffer_size"))
                .ok()
                .filter(|size| (1..=MAX_BROTLI_BUFFER_SIZE).contains(size))
                .ok_or_else(|| {
                    StageError::invalid_param("buffer_size", "must be between 1 and 1048576")
                })?
        } else {
            DEFAULT_BROTLI_BUFFER_SIZE
        };
        Ok(Self::new(upstream, buffer_size))
    }

    fn upstream(&self) -> &BoxFilter {
        self.get_ref()
    }

    fn upstream_mut(&mut self) -> &mut BoxFilter {
        self.get_mut()
    }
}

/// Returns the `gzip` stage registration.
pub fn gzip() -> FilterDef {
    Gzip::filter_def()
}

/// Returns the `zlib` stage registration.
pub fn zlib() -> FilterDef {
    Zlib::filter_def()
}

/// Returns the `deflate` stage registration.
pub fn deflate() -> FilterDef {
    Deflate::filter_def()
}

/// Returns the `brotli` stage registration.
pub fn brotli() -> FilterDef {
    Brotli::filter_def()
}

#[cfg(test)]
mod tests {
    use super::*;
    use readchain_core::{is_closed, Input, Root};
    use readchain_test::{fixtures, layer_names, read_all, CloseLog, MemorySource};
    use serde_json::json;

    fn source(data: Vec<u8>, log: &CloseLog) -> BoxFilter {
        Input::resource(MemorySource::new(data, log).chunked(7)).into_filter()
    }

    fn build(
        def: &FilterDef,
        params: &Params,
        upstream: BoxFilter,
    ) -> Result<BoxFilter, StageError> {
        def.constructor().new_filter(params, upstream)
    }

    // ============== Decoding Tests ==============

    #[test]
    fn test_gzip_decodes() {
        let log = CloseLog::new();
        let upstream = source(fixtures::gzip(fixtures::SAMPLE), &log);
        let mut filter = build(&gzip(), &Params::new(), upstream).unwrap();
        assert_eq!(read_all(&mut filter).unwrap(), fixtures::SAMPLE);
    }

    #[test]
    fn test_gzip_concatenated_members() {
        let log = CloseLog::new();
        let mut data = fixtures::gzip(b"first ");
        data.extend(fixtures::gzip(b"second"));
        let mut filter = build(&gzip(), &Params::new(), source(data, &log)).unwrap();
        assert_eq!(read_all(&mut filter).unwrap(), b"first second");
    }

    #[test]
    fn test_zlib_decodes() {
        let log = CloseLog::new();
        let upstream = source(fixtures::zlib(fixtures::SAMPLE), &log);
        let mut filter = build(&zlib(), &Params::new(), upstream).unwrap();
        assert_eq!(read_all(&mut filter).unwrap(), fixtures::SAMPLE);
    }

    #[test]
    fn test_deflate_decodes() {
        let log = CloseLog::new();
        let upstream = source(fixtures::deflate(fixtures::SAMPLE), &log);
        let mut filter = build(&deflate(), &Params::new(), upstream).unwrap();
        assert_eq!(read_all(&mut filter).unwrap(), fixtures::SAMPLE);
    }

    #[test]
    fn test_brotli_decodes() {
        let log = CloseLog::new();
        let params = Params::from_iter([("buffer_size", json!(64))]);
        let upstream = source(fixtures::brotli(fixtures::SAMPLE), &log);
        let mut filter = build(&brotli(), &params, upstream).unwrap();
        assert_eq!(read_all(&mut filter).unwrap(), fixtures::SAMPLE);
    }

    #[test]
    fn test_corrupt_input_fails_read() {
        let log = CloseLog::new();
        let upstream = source(b"not gzip at all".to_vec(), &log);
        let mut filter = build(&gzip(), &Params::new(), upstream).unwrap();
        assert!(read_all(&mut filter).is_err());
    }

    // ============== Construction Tests ==============

    #[test]
    fn test_detached_upstream_rejected() {
        for def in [gzip(), zlib(), deflate(), brotli()] {
            let err = build(&def, &Params::new(), Box::new(Root::detached())).err().unwrap();
            assert!(matches!(err, StageError::MissingUpstream), "{}", def.name());
        }
    }

    #[test]
    fn test_brotli_rejects_bad_buffer_size() {
        let log = CloseLog::new();
        let too_big = MAX_BROTLI_BUFFER_SIZE + 1;
        for value in [json!(0), json!(-4), json!("big"), json!(too_big), json!(1_u64 << 50)] {
            let params = Params::from_iter([("buffer_size", value)]);
            let err = build(&brotli(), &params, source(Vec::new(), &log)).err().unwrap();
            assert!(
                matches!(err, StageError::InvalidParam { ref key, .. } if key == "buffer_size"),
                "{err}"
            );
        }

        let params = Params::from_iter([("buffer_size", json!(MAX_BROTLI_BUFFER_SIZE))]);
        assert!(build(&brotli(), &params, source(Vec::new(), &log)).is_ok());
    }

    // ============== Lifecycle Tests ==============

    #[test]
    fn test_source_and_close() {
        let log = CloseLog::new();
        let upstream = source(fixtures::zlib(b"x"), &log);
        let mut filter = build(&zlib(), &Params::new(), upstream).unwrap();
        assert_eq!(layer_names(filter.as_ref()), vec!["zlib", "root"]);

        filter.close().unwrap();
        filter.close().unwrap();
        assert_eq!(log.entries(), vec!["source"]);

        let err = filter.read(&mut [0u8; 8]).unwrap_err();
        assert!(is_closed(&err));
    }

    #[test]
    fn test_downcast_to_stage_type() {
        let log = CloseLog::new();
        let upstream = source(fixtures::gzip(b"x"), &log);
        let filter = build(&gzip(), &Params::new(), upstream).unwrap();
        let layer = Layer::Filter(filter.as_ref());
        assert!(layer.downcast_ref::<Gzip>().is_some());
        assert!(layer.downcast_ref::<Zlib>().is_none());
    }
}
