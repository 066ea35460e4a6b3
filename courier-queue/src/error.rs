//! Error types for engine operations.

use thiserror::Error;

/// Result type for engine operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Engine-specific errors.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Request was already accepted into a lane
    #[error("request has already been queued")]
    AlreadyQueued,

    /// Worker thread already running
    #[error("worker already running")]
    WorkerAlreadyRunning,

    /// Worker thread not running
    #[error("worker not running")]
    WorkerNotRunning,

    /// Worker thread could not be spawned
    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),

    /// Request processing failed
    #[error("request processing failed: {0}")]
    ProcessingFailed(String),

    /// Generic error
    #[error("queue error: {0}")]
    Other(String),
}
