//! Base64 decoding stage.
//!
//! Decodes a base64 stream, skipping ASCII whitespace so wrapped (MIME/PEM
//! style) input reads as is. Padding is optional.
//!
//! Params:
//!
//! - `alphabet`: `"standard"` (default) or `"url"`

use super::compression::Decoder;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use readchain_core::{BoxFilter, FilterDef, Params, StageError};
use std::io::{self, Read};

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

static STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
static URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

const READ_CHUNK: usize = 4096;

/// Streaming base64 decoder over an upstream filter.
pub struct Base64Decoder {
    upstream: BoxFilter,
    engine: &'static GeneralPurpose,
    /// Encoded bytes not yet decoded, whitespace removed.
    pending: Vec<u8>,
    decoded: Vec<u8>,
    pos: usize,
    eof: bool,
}

impl Base64Decoder {
    fn fill(&mut self) -> io::Result<()> {
        self.decoded.clear();
        self.pos = 0;

        let mut chunk = [0u8; READ_CHUNK];
        let n = self.upstream.read(&mut chunk)?;
        if n == 0 {
            self.eof = true;
            let rest = std::mem::take(&mut self.pending);
            return self.decode(&rest);
        }

        self.pending
            .extend(chunk[..n].iter().copied().filter(|b| !b.is_ascii_whitespace()));
        let whole = self.pending.len() / 4 * 4;
        if whole == 0 {
            return Ok(());
        }
        let quads: Vec<u8> = self.pending.drain(..whole).collect();
        self.decode(&quads)
    }

    fn decode(&mut self, input: &[u8]) -> io::Result<()> {
        if input.is_empty() {
            return Ok(());
        }
        self.engine
            .decode_vec(input, &mut self.decoded)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}

impl Read for Base64Decoder {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.pos == self.decoded.len() {
            if self.eof {
                return Ok(0);
            }
            self.fill()?;
        }
        let available = &self.decoded[self.pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl Decoder for Base64Decoder {
    const NAME: &'static str = "base64";

    fn wrap(upstream: BoxFilter, params: &Params) -> Result<Self, StageError> {
        let engine = match params.get_string("alphabet").as_str() {
            "" | "standard" => &STANDARD,
            "url" => &URL_SAFE,
            other => {
                return Err(StageError::invalid_param(
                    "alphabet",
                    format!("unsupported alphabet {other:?}"),
                ))
            }
        };
        Ok(Self {
            upstream,
            engine,
            pending: Vec::new(),
            decoded: Vec::new(),
            pos: 0,
            eof: false,
        })
    }

    fn upstream(&self) -> &BoxFilter {
        &self.upstream
    }

    fn upstream_mut(&mut self) -> &mut BoxFilter {
        &mut self.upstream
    }
}

/// The `base64` stage.
pub type Base64 = super::compression::Decode<Base64Decoder>;

/// Returns the `base64` stage registration.
pub fn base64() -> FilterDef {
    Base64::filter_def()
}
