//! Test error types.

use std::fmt;
use std::io;

/// Errors that can occur during testing.
#[derive(Debug)]
pub enum TestError {
    /// Reading from a chain failed
    Read(io::Error),
    /// Chain resolution failed
    Chain(readchain_core::ChainError),
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(e) => write!(f, "Read error: {e}"),
            Self::Chain(e) => write!(f, "Chain error: {e}"),
        }
    }
}

impl std::error::Error for TestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read(e) => Some(e),
            Self::Chain(e) => Some(e),
        }
    }
}

impl From<io::Error> for TestError {
    fn from(e: io::Error) -> Self {
        Self::Read(e)
    }
}

impl From<readchain_core::ChainError> for TestError {
    fn from(e: readchain_core::ChainError) -> Self {
        Self::Chain(e)
    }
}
