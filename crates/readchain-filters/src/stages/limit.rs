//! Byte limit stage.
//!
//! Passes at most `bytes` bytes through, then reports end of stream. The
//! upstream is not read past the limit.

use readchain_core::{
    closed, BoxFilter, Filter, FilterDef, Layer, Params, ReadClose, StageError,
};
use std::io::{self, Read};

/// A stage truncating its upstream to a fixed number of bytes.
pub struct Limit {
    inner: BoxFilter,
    limit: u64,
    remaining: u64,
    closed: bool,
}

impl Limit {
    /// Builds the stage over `upstream`.
    ///
    /// `bytes` is required and must not be negative.
    pub fn new(upstream: BoxFilter, params: &Params) -> Result<Self, StageError> {
        if !params.contains_key("bytes") {
            return Err(StageError::invalid_param("bytes", "is required"));
        }
        let limit = u64::try_from(params.get_int("bytes"))
            .map_err(|_| StageError::invalid_param("bytes", "must not be negative"))?;
        Ok(Self {
            inner: upstream,
            limit,
            remaining: limit,
            closed: false,
        })
    }

    /// Returns the configured limit.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Returns how many more bytes may pass.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl Read for Limit {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.closed {
            return Err(closed());
        }
        if self.remaining == 0 {
            return Ok(0);
        }
        let max = usize::try_from(self.remaining).map_or(buf.len(), |r| r.min(buf.len()));
        let n = self.inner.read(&mut buf[..max])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}

impl ReadClose for Limit {
    fn close(&mut self) -> io::Result<()> {
        if std::mem::replace(&mut self.closed, true) {
            return Ok(());
        }
        self.inner.close()
    }
}

impl Filter for Limit {
    fn name(&self) -> &str {
        "limit"
    }

    fn source(&self) -> Option<Layer<'_>> {
        Some(Layer::Filter(&*self.inner))
    }
}

/// Returns the `limit` stage registration.
pub fn limit() -> FilterDef {
    FilterDef::new("limit", |params: &Params, upstream: BoxFilter| {
        Ok(Box::new(Limit::new(upstream, params)?) as BoxFilter)
    })
}
