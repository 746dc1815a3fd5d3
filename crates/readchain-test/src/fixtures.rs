//! Payload and configuration fixtures.
//!
//! # Example
//!
//! ```
//! use readchain_test::fixtures;
//! use std::io::Read;
//!
//! let compressed = fixtures::gzip(fixtures::SAMPLE);
//! let mut decoder = flate2::read::GzDecoder::new(&compressed[..]);
//! let mut out = Vec::new();
//! decoder.read_to_end(&mut out).unwrap();
//! assert_eq!(out, fixtures::SAMPLE);
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
use flate2::{Compression, Crc};
use readchain_core::{Chain, ChainConfig, Params, StageDef};
use serde_json::json;
use std::io::{Cursor, Write};

/// A short text payload spanning several lines.
pub const SAMPLE: &[u8] = b"The quick brown fox jumps over the lazy dog.\n\
Pack my box with five dozen liquor jugs.\n\
How vexingly quick daft zebras jump!\n";

/// Returns `data` gzip-compressed.
#[must_use]
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("write to Vec");
    encoder.finish().expect("finish gzip stream")
}

/// Returns `data` zlib-compressed.
#[must_use]
pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("write to Vec");
    encoder.finish().expect("finish zlib stream")
}

/// Returns `data` compressed as a raw deflate stream.
#[must_use]
pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("write to Vec");
    encoder.finish().expect("finish deflate stream")
}

/// Returns `data` brotli-compressed.
#[must_use]
pub fn brotli(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::new();
    let params = brotli::enc::BrotliEncoderParams {
        quality: 5,
        ..Default::default()
    };
    brotli::BrotliCompress(&mut Cursor::new(data), &mut output, &params)
        .expect("compress into Vec");
    output
}

/// Returns `data` base64-encoded with the standard alphabet, wrapped at
/// 76 columns.
#[must_use]
pub fn base64_wrapped(data: &[u8]) -> Vec<u8> {
    let encoded = STANDARD.encode(data);
    let mut out = Vec::with_capacity(encoded.len() + encoded.len() / 76 + 1);
    for line in encoded.as_bytes().chunks(76) {
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }
    out
}

/// Returns the CRC-32 of `data`.
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(data);
    crc.sum()
}

/// A configuration with one chain, `"pipe"`: gzip decompression followed by
/// a CRC-32 check against `expect`.
#[must_use]
pub fn gzip_checksum_config(expect: u32) -> ChainConfig {
    ChainConfig::new().chain(
        "pipe",
        Chain::new().then(StageDef::new("gzip")).then(
            StageDef::new("checksum").with_params(Params::from_iter([
                ("algo", json!("crc32")),
                ("expect", json!(expect)),
            ])),
        ),
    )
}
