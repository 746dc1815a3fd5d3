//! Metering stage.
//!
//! Passes bytes through unchanged, counting bytes and reads. Every read adds
//! to the `readchain_filter_bytes_total` counter, labelled with the stage's
//! `label` param (default `"meter"`).

use metrics::{counter, Counter};
use readchain_core::{closed, BoxFilter, Filter, FilterDef, Layer, Params, ReadClose};
use std::io::{self, Read};
use tracing::debug;

/// Label used when none is configured.
pub const DEFAULT_LABEL: &str = "meter";

/// A pass-through stage counting the bytes read through it.
pub struct Meter {
    inner: BoxFilter,
    label: String,
    bytes: u64,
    reads: u64,
    counter: Counter,
    closed: bool,
}

impl Meter {
    /// Builds the stage over `upstream`.
    pub fn new(upstream: BoxFilter, params: &Params) -> Self {
        let mut label = params.get_string("label");
        if label.is_empty() {
            label = DEFAULT_LABEL.to_string();
        }
        let counter = counter!("readchain_filter_bytes_total", "label" => label.clone());
        Self {
            inner: upstream,
            label,
            bytes: 0,
            reads: 0,
            counter,
            closed: false,
        }
    }

    /// Returns the metric label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the number of bytes read so far.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Returns the number of reads so far, including the one reporting end of
    /// stream.
    pub fn reads(&self) -> u64 {
        self.reads
    }
}

impl Read for Meter {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.closed {
            return Err(closed());
        }
        let n = self.inner.read(buf)?;
        self.reads += 1;
        self.bytes += n as u64;
        self.counter.increment(n as u64);
        Ok(n)
    }
}

impl ReadClose for Meter {
    fn close(&mut self) -> io::Result<()> {
        if std::mem::replace(&mut self.closed, true) {
            return Ok(());
        }
        debug!(label = %self.label, bytes = self.bytes, reads = self.reads, "Meter closed");
        self.inner.close()
    }
}

impl Filter for Meter {
    fn name(&self) -> &str {
        "meter"
    }

    fn source(&self) -> Option<Layer<'_>> {
        Some(Layer::Filter(&*self.inner))
    }
}

/// Returns the `meter` stage registration.
pub fn meter() -> FilterDef {
    FilterDef::new("meter", |params: &Params, upstream: BoxFilter| {
        Ok(Box::new(Meter::new(upstream, params)) as BoxFilter)
    })
}
