//! Recording and failing stages.

use crate::error::TestError;
use crate::source::CloseLog;
use readchain_core::{
    apply_filter, closed, BoxFilter, Filter, FilterDef, Layer, Params, ReadClose, StageError,
};
use std::convert::Infallible;
use std::io::{self, Read};

/// A pass-through stage that records its closes.
pub struct TagFilter {
    name: String,
    inner: BoxFilter,
    log: CloseLog,
    closed: bool,
}

impl TagFilter {
    /// Wraps `inner`, recording closes under `name`.
    pub fn new(name: impl Into<String>, inner: BoxFilter, log: &CloseLog) -> Self {
        Self {
            name: name.into(),
            inner,
            log: log.clone(),
            closed: false,
        }
    }
}

impl Read for TagFilter {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.closed {
            return Err(closed());
        }
        self.inner.read(buf)
    }
}

impl ReadClose for TagFilter {
    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        self.log.record(self.name.clone());
        self.inner.close()
    }
}

impl Filter for TagFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> Option<Layer<'_>> {
        Some(Layer::Filter(&*self.inner))
    }
}

/// Registers a [`TagFilter`] under `name`.
pub fn tag_filter(name: &str, log: &CloseLog) -> FilterDef {
    let tag = name.to_string();
    let log = log.clone();
    FilterDef::new(name, move |_: &Params, upstream: BoxFilter| {
        Ok(Box::new(TagFilter::new(tag.clone(), upstream, &log)) as BoxFilter)
    })
}

/// Registers a stage under `name` whose constructor always fails with
/// `reason`.
pub fn failing_filter(name: &str, reason: &str) -> FilterDef {
    let reason = reason.to_string();
    FilterDef::new(name, move |_: &Params, _: BoxFilter| {
        Err(StageError::other(reason.clone()))
    })
}

/// Returns the name of every layer of `filter`, outermost first.
///
/// Plain resources are reported as `"resource"`.
pub fn layer_names(filter: &dyn Filter) -> Vec<String> {
    let mut names = Vec::new();
    let _ = apply_filter(filter, |layer| {
        names.push(layer.name().unwrap_or("resource").to_string());
        Ok::<_, Infallible>(())
    });
    names
}

/// Reads `reader` to the end.
pub fn read_all<R: Read + ?Sized>(reader: &mut R) -> Result<Vec<u8>, TestError> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out)?;
    Ok(out)
}
