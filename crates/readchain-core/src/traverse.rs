//! Walking a chain from the outermost layer down.
//!
//! [`apply`] visits a layer, then the layer it reads from, and so on until it
//! reaches a layer with no source or a plain resource. The callback can stop
//! the walk early by returning an error.
//!
//! # Example
//!
//! ```
//! use readchain_core::{apply_filter, Input};
//! use std::convert::Infallible;
//! use std::io::Cursor;
//!
//! let filter = Input::reader(Cursor::new(Vec::new())).into_filter();
//!
//! let mut visited = Vec::new();
//! apply_filter(filter.as_ref(), |layer| {
//!     visited.push(layer.name().unwrap_or("resource"));
//!     Ok::<_, Infallible>(())
//! })
//! .unwrap();
//!
//! assert_eq!(visited, vec!["root"]);
//! ```

use crate::filter::{Filter, Layer};
use std::iter;

/// Calls `cb` on `start` and then on each layer beneath it.
///
/// The walk continues through [`Filter::source`] while the current layer is a
/// filter with a source. It stops after a [`Layer::Resource`], after a
/// filter whose source is `None`, or at the first error from `cb`, which is
/// returned unchanged.
pub fn apply<'a, E>(
    start: Layer<'a>,
    mut cb: impl FnMut(Layer<'a>) -> Result<(), E>,
) -> Result<(), E> {
    let mut current = Some(start);
    while let Some(layer) = current {
        cb(layer)?;
        current = layer.as_filter().and_then(Filter::source);
        if let Some(next) = current {
            tracing::trace!(layer = ?layer, next = ?next, "Descending chain");
        }
    }
    Ok(())
}

/// Calls `cb` on `filter` and then on each layer beneath it.
///
/// Shorthand for `apply(Layer::Filter(filter), cb)`.
pub fn apply_filter<'a, E>(
    filter: &'a dyn Filter,
    cb: impl FnMut(Layer<'a>) -> Result<(), E>,
) -> Result<(), E> {
    apply(Layer::Filter(filter), cb)
}

/// Returns the layers of a chain, outermost first.
pub fn layers(filter: &dyn Filter) -> impl Iterator<Item = Layer<'_>> {
    iter::successors(Some(Layer::Filter(filter)), |layer| {
        layer.as_filter().and_then(Filter::source)
    })
}

/// Returns the outermost layer of type `T`.
#[must_use]
pub fn find<T: Filter>(filter: &dyn Filter) -> Option<&T> {
    layers(filter).find_map(Layer::downcast_ref::<T>)
}
