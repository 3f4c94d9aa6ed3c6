//! Cache errors

use thiserror::Error;

/// Errors that can occur while navigating the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Navigation target outside `[0, len)`.
    #[error("index {index} is out of range for a sequence of {len} entries")]
    OutOfRange { index: i64, len: usize },

    /// The resolver had no handler, or fetching/consuming the content failed.
    #[error("failed to fetch {identifier}: {reason}")]
    FetchFailed { identifier: String, reason: String },

    /// The cache or entry has been disposed.
    #[error("cache has been disposed")]
    Disposed,

    /// A window policy failed validation.
    #[error("invalid window policy: {0}")]
    InvalidPolicy(String),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
