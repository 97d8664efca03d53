//! Error types for hotcache

use std::fmt;

/// Result type alias for hotcache operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error types for cache operations
#[derive(Debug)]
pub enum Error {
    /// Requested capacity cannot hold a single entry
    InvalidCapacity(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCapacity(requested) => {
                write!(f, "Invalid capacity: {} (must be at least 1)", requested)
            }
        }
    }
}

impl std::error::Error for Error {}
