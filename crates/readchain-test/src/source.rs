//! In-memory sources.

use readchain_core::{closed, ReadClose};
use std::io::{self, Cursor, Read};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared record of which layers were closed, in order.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct CloseLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CloseLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a close of `name`.
    pub fn record(&self, name: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name.into());
    }

    /// Returns every recorded close, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns how many times `name` was closed.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|entry| *entry == name)
            .count()
    }

    /// Returns true if nothing was closed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

/// A byte buffer behaving like an external resource.
///
/// Closes are recorded in a [`CloseLog`]; reads after a close fail with
/// [`closed`]. Reads can be capped to a chunk size to exercise stages against
/// short reads.
#[derive(Debug)]
pub struct MemorySource {
    name: String,
    data: Cursor<Vec<u8>>,
    chunk: Option<usize>,
    closed: bool,
    log: CloseLog,
}

impl MemorySource {
    /// Creates a source named `source` over `data`.
    pub fn new(data: impl Into<Vec<u8>>, log: &CloseLog) -> Self {
        Self::named("source", data, log)
    }

    /// Creates a source that records its closes under `name`.
    pub fn named(name: impl Into<String>, data: impl Into<Vec<u8>>, log: &CloseLog) -> Self {
        Self {
            name: name.into(),
            data: Cursor::new(data.into()),
            chunk: None,
            closed: false,
            log: log.clone(),
        }
    }

    /// Returns at most `size` bytes per read.
    #[must_use]
    pub fn chunked(mut self, size: usize) -> Self {
        self.chunk = Some(size.max(1));
        self
    }

    /// Returns true once closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Read for MemorySource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.closed {
            return Err(closed());
        }
        let len = self.chunk.map_or(buf.len(), |chunk| chunk.min(buf.len()));
        self.data.read(&mut buf[..len])
    }
}

impl ReadClose for MemorySource {
    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        self.log.record(self.name.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use readchain_core::is_closed;

    #[test]
    fn test_chunked_reads() {
        let log = CloseLog::new();
        let mut source = MemorySource::new(b"abcdef".to_vec(), &log).chunked(2);
        let mut buf = [0u8; 8];
        assert_eq!(source.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ab");

        let mut rest = Vec::new();
        source.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"cdef");
    }

    #[test]
    fn test_close_is_recorded() {
        let log = CloseLog::new();
        let mut source = MemorySource::named("file", b"x".to_vec(), &log);
        assert!(log.is_empty());

        source.close().unwrap();
        assert!(source.is_closed());
        assert_eq!(log.entries(), vec!["file"]);
        assert_eq!(log.count("file"), 1);

        let err = source.read(&mut [0u8; 1]).unwrap_err();
        assert!(is_closed(&err));
    }
}
