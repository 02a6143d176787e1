//! Crate-level error types.
//!
//! [`BalanceError`] unifies every error source (configuration, cache,
//! capability lookup, remote service, JSON) behind a single enum so callers
//! can match on the variant they care about while still using the `?`
//! operator for easy propagation.

use crate::services::RemoteError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BalanceError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum BalanceError {
    /// An environment variable or config file was invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The cache store could not be read.
    #[error("cache error: {0}")]
    Cache(String),

    /// The capability level could not be determined.
    #[error("capability error: {0}")]
    Capability(String),

    /// The remote balance service failed.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A file could not be read.
    #[error("io error: {0}")]
    Io(String),
}
