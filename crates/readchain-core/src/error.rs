//! Error types for readchain.
//!
//! [`ChainError`] covers registry and resolution failures. Every resolution
//! failure is attributed to a chain name and, when a stage is involved, to
//! the stage's position and filter name:
//!
//! ```text
//! unknown chain "missing"
//! pipe[1]: unknown filter "rot13"
//! pipe[0]gzip: missing upstream source
//! ```
//!
//! [`StageError`] is what stage constructors return. [`Closed`] is the
//! condition a stage reports when read after it has been closed.

use std::error::Error as StdError;
use std::io;
use thiserror::Error;

/// Boxed error type for causes that have no dedicated variant.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result type alias using [`ChainError`].
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors from registering filters and resolving chains.
#[derive(Error, Debug)]
pub enum ChainError {
    /// A filter of this name is already registered.
    #[error("filter {name:?} already registered")]
    DuplicateRegistration {
        /// The duplicated filter name.
        name: String,
    },

    /// The requested chain is not configured.
    #[error("unknown chain {chain:?}")]
    UnknownChain {
        /// The requested chain name.
        chain: String,
    },

    /// A chain references a filter that is not registered.
    #[error("{chain}[{position}]: unknown filter {filter:?}")]
    UnknownStage {
        /// The chain being resolved.
        chain: String,
        /// Zero-based position of the stage in the chain.
        position: usize,
        /// The unregistered filter name.
        filter: String,
    },

    /// A stage constructor failed.
    #[error("{chain}[{position}]{filter}: {source}")]
    StageConstruction {
        /// The chain being resolved.
        chain: String,
        /// Zero-based position of the stage in the chain.
        position: usize,
        /// The filter whose constructor failed.
        filter: String,
        /// The constructor's error.
        #[source]
        source: StageError,
    },
}

impl ChainError {
    /// Returns the chain this error is attributed to, if any.
    #[must_use]
    pub fn chain(&self) -> Option<&str> {
        match self {
            Self::UnknownChain { chain }
            | Self::UnknownStage { chain, .. }
            | Self::StageConstruction { chain, .. } => Some(chain),
            Self::DuplicateRegistration { .. } => None,
        }
    }

    /// Returns the stage position this error is attributed to, if any.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::UnknownStage { position, .. } | Self::StageConstruction { position, .. } => {
                Some(*position)
            }
            _ => None,
        }
    }

    /// Returns the filter name this error is attributed to, if any.
    #[must_use]
    pub fn filter(&self) -> Option<&str> {
        match self {
            Self::DuplicateRegistration { name: filter }
            | Self::UnknownStage { filter, .. }
            | Self::StageConstruction { filter, .. } => Some(filter),
            _ => None,
        }
    }
}

/// Errors returned by stage constructors.
#[derive(Error, Debug)]
pub enum StageError {
    /// A parameter has an unusable value.
    #[error("invalid parameter {key:?}: {reason}")]
    InvalidParam {
        /// The parameter key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The stage needs an upstream source but the chain has none.
    #[error("missing upstream source")]
    MissingUpstream,

    /// I/O failure while setting up the stage.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Any other failure.
    #[error(transparent)]
    Other(BoxError),
}

impl StageError {
    /// Create a new invalid parameter error.
    pub fn invalid_param(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParam {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an arbitrary error.
    pub fn other(err: impl Into<BoxError>) -> Self {
        Self::Other(err.into())
    }
}

/// Reported by a stage that is used after it has been closed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[error("closed")]
pub struct Closed;

/// Returns the [`io::Error`] a closed stage reports from `read`.
#[must_use]
pub fn closed() -> io::Error {
    io::Error::other(Closed)
}

/// Returns true if `err` was produced by [`closed`].
#[must_use]
pub fn is_closed(err: &io::Error) -> bool {
    err.get_ref().is_some_and(|inner| inner.is::<Closed>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_registration_display() {
        let err = ChainError::DuplicateRegistration {
            name: "gzip".to_string(),
        };
        assert_eq!(err.to_string(), r#"filter "gzip" already registered"#);
        assert_eq!(err.filter(), Some("gzip"));
        assert_eq!(err.chain(), None);
    }

    #[test]
    fn test_unknown_chain_display() {
        let err = ChainError::UnknownChain {
            chain: "pipe".to_string(),
        };
        assert_eq!(err.to_string(), r#"unknown chain "pipe""#);
        assert_eq!(err.chain(), Some("pipe"));
        assert_eq!(err.position(), None);
    }

    #[test]
    fn test_unknown_stage_display() {
        let err = ChainError::UnknownStage {
            chain: "pipe".to_string(),
            position: 1,
            filter: "rot13".to_string(),
        };
        assert_eq!(err.to_string(), r#"pipe[1]: unknown filter "rot13""#);
        assert_eq!(err.position(), Some(1));
        assert_eq!(err.filter(), Some("rot13"));
    }

    #[test]
    fn test_stage_construction_keeps_source() {
        let err = ChainError::StageConstruction {
            chain: "pipe".to_string(),
            position: 0,
            filter: "limit".to_string(),
            source: StageError::invalid_param("bytes", "must not be negative"),
        };
        assert_eq!(
            err.to_string(),
            r#"pipe[0]limit: invalid parameter "bytes": must not be negative"#
        );
        let source = err.source().unwrap();
        assert!(source.is::<StageError>());
    }

    #[test]
    fn test_closed_round_trip() {
        let err = closed();
        assert!(is_closed(&err));
        assert_eq!(err.to_string(), "closed");
        assert!(!is_closed(&io::Error::other("closed")));
    }

    #[test]
    fn test_stage_error_other() {
        let err = StageError::other("boom");
        assert_eq!(err.to_string(), "boom");
    }
}
