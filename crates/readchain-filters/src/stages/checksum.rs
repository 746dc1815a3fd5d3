//! Checksum stage.
//!
//! Passes bytes through unchanged while computing their CRC-32. With an
//! `expect` value the checksum is verified when the upstream reaches end of
//! stream; a mismatch fails that read with [`io::ErrorKind::InvalidData`].
//!
//! Params:
//!
//! - `algo`: `"crc32"` (the default when empty)
//! - `expect`: the expected checksum, as an integer or a hex string
//!   (`"cbf43926"` or `"0xcbf43926"`)
//!
//! The running sum is readable mid-stream: find the stage with
//! [`readchain_core::find`] and call [`Checksum::sum`].

use flate2::Crc;
use readchain_core::{
    closed, BoxFilter, Filter, FilterDef, Layer, Params, ReadClose, StageError,
};
use serde_json::Value;
use std::io::{self, Read};
use thiserror::Error;

/// Reported when the bytes read do not match the expected checksum.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
pub struct ChecksumMismatch {
    /// The configured checksum.
    pub expected: u32,
    /// The checksum of the bytes read.
    pub actual: u32,
}

/// A pass-through stage computing a CRC-32.
pub struct Checksum {
    inner: BoxFilter,
    crc: Crc,
    expect: Option<u32>,
    closed: bool,
}

impl Checksum {
    /// Builds the stage over `upstream`.
    pub fn new(upstream: BoxFilter, params: &Params) -> Result<Self, StageError> {
        match params.get_string("algo").as_str() {
            "" | "crc32" => {}
            other => {
                return Err(StageError::invalid_param(
                    "algo",
                    format!("unsupported algorithm {other:?}"),
                ))
            }
        }
        Ok(Self {
            inner: upstream,
            crc: Crc::new(),
            expect: parse_expect(params)?,
            closed: false,
        })
    }

    /// Returns the checksum of the bytes read so far.
    pub fn sum(&self) -> u32 {
        self.crc.sum()
    }

    /// Returns the number of bytes read so far, modulo 2^32.
    pub fn bytes_read(&self) -> u32 {
        self.crc.amount()
    }

    /// Returns the expected checksum, if one is configured.
    pub fn expected(&self) -> Option<u32> {
        self.expect
    }

    fn verify(&self) -> io::Result<()> {
        match self.expect {
            Some(expected) if expected != self.sum() => {
                tracing::warn!(expected, actual = self.sum(), "Checksum mismatch");
                Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    ChecksumMismatch {
                        expected,
                        actual: self.sum(),
                    },
                ))
            }
            _ => Ok(()),
        }
    }
}

fn parse_expect(params: &Params) -> Result<Option<u32>, StageError> {
    let invalid = || StageError::invalid_param("expect", "must be a 32-bit integer or hex string");
    match params.get("expect") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(invalid),
        Some(Value::String(hex)) => {
            let digits = hex
                .strip_prefix("0x")
                .or_else(|| hex.strip_prefix("0X"))
                .unwrap_or(hex);
            u32::from_str_radix(digits, 16)
                .map(Some)
                .map_err(|_| invalid())
        }
        Some(_) => Err(invalid()),
    }
}

impl Read for Checksum {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.closed {
            return Err(closed());
        }
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.crc.update(&buf[..n]);
        } else if !buf.is_empty() {
            self.verify()?;
        }
        Ok(n)
    }
}

impl ReadClose for Checksum {
    fn close(&mut self) -> io::Result<()> {
        if std::mem::replace(&mut self.closed, true) {
            return Ok(());
        }
        self.inner.close()
    }
}

impl Filter for Checksum {
    fn name(&self) -> &str {
        "checksum"
    }

    fn source(&self) -> Option<Layer<'_>> {
        Some(Layer::Filter(&*self.inner))
    }
}

/// Returns the `checksum` stage registration.
pub fn checksum() -> FilterDef {
    FilterDef::new("checksum", |params: &Params, upstream: BoxFilter| {
        Ok(Box::new(Checksum::new(upstream, params)?) as BoxFilter)
    })
}
