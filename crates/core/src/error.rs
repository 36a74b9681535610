//! Unified error types for wxcache.
//!
//! Display strings carry a stable code prefix so log lines and CLI output
//! can be grepped by failure class.

use crate::config::ConfigError;

/// Unified error types for the forecast cache and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an unknown source name).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Filesystem operation on the cache failed.
    #[error("CACHE_ERROR: {0}")]
    Cache(#[from] std::io::Error),

    /// No fetch route exists for the source/location pair.
    #[error("UNSUPPORTED_ROUTE: {source_name} has no product for {location}")]
    UnsupportedRoute { source_name: String, location: String },

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// HTTP error response or transport failure.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// The request registry could not be read or appended to.
    #[error("REGISTRY_ERROR: {0}")]
    Registry(String),

    /// The mailbox refused a fetch, send, or move.
    #[error("MAILBOX_ERROR: {0}")]
    Mailbox(String),

    /// Configuration could not be loaded or is invalid.
    #[error("CONFIG_ERROR: {0}")]
    Config(#[from] ConfigError),
}
