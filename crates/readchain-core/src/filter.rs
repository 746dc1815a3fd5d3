//! The filter contract.
//!
//! A resolved chain is an onion of readers. Each layer implements [`Filter`]:
//! it can be read, closed, and asked for the layer beneath it. The innermost
//! layer is a [`Root`], which lifts whatever plain [`ReadClose`] resource the
//! caller supplied (or nothing at all) into the contract.
//!
//! ```text
//!  caller ── read ──► checksum ──► gzip ──► Root ──► File
//!                       │           │        │
//!            source() ──┘───────────┘────────┘── None
//! ```

use crate::error::closed;
use std::any::Any;
use std::fmt;
use std::io::{self, Read};

/// A boxed, type-erased filter.
pub type BoxFilter = Box<dyn Filter>;

/// A readable resource that must be closed to release what it holds.
///
/// This is the boundary with external code: whatever the caller hands to a
/// chain as its source implements this trait.
pub trait ReadClose: Read + Send {
    /// Releases the resource.
    ///
    /// Reads after a successful close should fail with [`closed`].
    fn close(&mut self) -> io::Result<()>;
}

impl<T: ReadClose + ?Sized> ReadClose for Box<T> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Upcast to [`Any`], implemented for every sized `'static` type.
///
/// Lets callers downcast a `&dyn Filter` to the concrete stage type.
pub trait AsAny: Any {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A stage in a read chain.
///
/// # Invariants
///
/// - [`source`](Filter::source) returns `None` for the innermost layer, and
///   otherwise exactly the layer this filter reads from
/// - [`close`](ReadClose::close) closes the filter's own resources; a stage
///   that owns its upstream closes it too
pub trait Filter: ReadClose + AsAny {
    /// Returns a short name for this layer, used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Returns the layer this filter reads from, or `None` if there is none.
    fn source(&self) -> Option<Layer<'_>>;

    /// Returns true if this layer stands in for an absent source.
    ///
    /// Constructors that need real input check this on their upstream.
    fn is_detached(&self) -> bool {
        false
    }
}

impl fmt::Debug for dyn Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter").field("name", &self.name()).finish()
    }
}

/// One layer of a chain, as reported by [`Filter::source`].
#[derive(Clone, Copy)]
pub enum Layer<'a> {
    /// A layer satisfying the filter contract.
    Filter(&'a dyn Filter),
    /// A plain resource: traversal stops here.
    Resource(&'a dyn ReadClose),
}

impl<'a> Layer<'a> {
    /// Returns the layer as a filter, if it is one.
    #[must_use]
    pub fn as_filter(self) -> Option<&'a dyn Filter> {
        match self {
            Self::Filter(f) => Some(f),
            Self::Resource(_) => None,
        }
    }

    /// Returns the filter's name, or `None` for a plain resource.
    #[must_use]
    pub fn name(self) -> Option<&'a str> {
        self.as_filter().map(Filter::name)
    }

    /// Downcasts a filter layer to its concrete type.
    #[must_use]
    pub fn downcast_ref<T: Filter>(self) -> Option<&'a T> {
        self.as_filter().and_then(|f| f.as_any().downcast_ref::<T>())
    }
}

impl fmt::Debug for Layer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter(filter) => f.debug_tuple("Filter").field(&filter.name()).finish(),
            Self::Resource(_) => f.write_str("Resource"),
        }
    }
}

impl<'a> From<&'a dyn Filter> for Layer<'a> {
    fn from(filter: &'a dyn Filter) -> Self {
        Self::Filter(filter)
    }
}

/// Lifts a plain [`ReadClose`] into a [`Filter`] with no source.
///
/// A root may also hold nothing at all ([`Root::detached`]); it then reads
/// as an empty stream.
#[derive(Default)]
pub struct Root {
    resource: Option<Box<dyn ReadClose>>,
    closed: bool,
}

impl Root {
    /// Wraps `resource` as the innermost layer of a chain.
    pub fn new(resource: impl ReadClose + 'static) -> Self {
        Self::from_boxed(Box::new(resource))
    }

    /// Wraps an already boxed resource.
    #[must_use]
    pub fn from_boxed(resource: Box<dyn ReadClose>) -> Self {
        Self {
            resource: Some(resource),
            closed: false,
        }
    }

    /// Creates a root with no underlying resource.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    /// Returns the wrapped resource, if any.
    pub fn resource(&self) -> Option<&dyn ReadClose> {
        self.resource.as_deref()
    }
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("detached", &self.resource.is_none())
            .field("closed", &self.closed)
            .finish()
    }
}

impl Read for Root {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.closed {
            return Err(closed());
        }
        match self.resource.as_mut() {
            Some(resource) => resource.read(buf),
            None => Ok(0),
        }
    }
}

impl ReadClose for Root {
    fn close(&mut self) -> io::Result<()> {
        if std::mem::replace(&mut self.closed, true) {
            return Ok(());
        }
        match self.resource.as_mut() {
            Some(resource) => resource.close(),
            None => Ok(()),
        }
    }
}

impl Filter for Root {
    fn name(&self) -> &str {
        "root"
    }

    fn source(&self) -> Option<Layer<'_>> {
        None
    }

    fn is_detached(&self) -> bool {
        self.resource.is_none()
    }
}

/// Adapts any [`Read`] into a [`ReadClose`].
///
/// Closing drops the reader; later reads fail with [`closed`].
pub struct Resource<R> {
    inner: Option<R>,
}

impl<R: Read + Send> Resource<R> {
    /// Wraps `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            inner: Some(reader),
        }
    }

    /// Returns the reader, or `None` once closed.
    pub fn get_ref(&self) -> Option<&R> {
        self.inner.as_ref()
    }

    /// Returns true once the resource has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl<R> fmt::Debug for Resource<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("closed", &self.inner.is_none())
            .finish()
    }
}

impl<R: Read> Read for Resource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.as_mut().ok_or_else(closed)?.read(buf)
    }
}

impl<R: Read + Send> ReadClose for Resource<R> {
    fn close(&mut self) -> io::Result<()> {
        self.inner = None;
        Ok(())
    }
}

/// The initial source handed to [`ChainSet::resolve`](crate::ChainSet::resolve).
pub enum Input {
    /// An existing filter; its own chain stays reachable by traversal.
    Filter(BoxFilter),
    /// A plain resource, wrapped in a [`Root`] before the first stage.
    Resource(Box<dyn ReadClose>),
}

impl Input {
    /// Uses an existing filter as the chain's starting point.
    pub fn filter(filter: impl Filter + 'static) -> Self {
        Self::Filter(Box::new(filter))
    }

    /// Uses a plain resource as the chain's starting point.
    pub fn resource(resource: impl ReadClose + 'static) -> Self {
        Self::Resource(Box::new(resource))
    }

    /// Uses any reader as the chain's starting point.
    pub fn reader(reader: impl Read + Send + 'static) -> Self {
        Self::resource(Resource::new(reader))
    }

    /// Converts the input into the chain's innermost filter.
    #[must_use]
    pub fn into_filter(self) -> BoxFilter {
        match self {
            Self::Filter(filter) => filter,
            Self::Resource(resource) => Box::new(Root::from_boxed(resource)),
        }
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter(filter) => f.debug_tuple("Filter").field(&filter.name()).finish(),
            Self::Resource(_) => f.write_str("Resource"),
        }
    }
}

impl From<BoxFilter> for Input {
    fn from(filter: BoxFilter) -> Self {
        Self::Filter(filter)
    }
}

impl From<Box<dyn ReadClose>> for Input {
    fn from(resource: Box<dyn ReadClose>) -> Self {
        Self::Resource(resource)
    }
}
