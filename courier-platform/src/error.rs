//! Platform error types.

use thiserror::Error;

/// Result type for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;

/// Platform-level errors surfaced through session callbacks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    /// The exchange itself failed (transport, HTTP status, injected fault);
    /// carries the engine-reported error string.
    #[error("request failed: {0}")]
    Request(String),

    /// The exchange succeeded but the payload is missing or invalid.
    #[error("invalid response payload: {0}")]
    Payload(String),

    /// Configuration error (environment variables, credentials).
    #[error("configuration error: {0}")]
    Config(String),
}
