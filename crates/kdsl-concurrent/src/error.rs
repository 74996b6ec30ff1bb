//! Writer error types.

use std::path::PathBuf;

use thiserror::Error;

/// Error type returned by a submitted action.
pub type ActionError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while driving an [`AsyncWriter`](crate::AsyncWriter).
#[derive(Debug, Error)]
pub enum WriterError {
    /// The queue is at capacity. Only reported by non-blocking submission.
    #[error("writer queue is full")]
    QueueFull,

    /// The writer no longer accepts commands.
    #[error("writer is closed")]
    Closed,

    /// The command was dropped before the worker executed it.
    #[error("command was cancelled before it ran")]
    Cancelled,

    /// The worker thread could not be spawned.
    #[error("failed to spawn writer thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// Writing a file failed.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        /// Destination of the failed write.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A submitted action returned an error.
    #[error("action failed: {0}")]
    Action(#[source] ActionError),

    /// A submitted action panicked.
    #[error("action panicked: {0}")]
    ActionPanicked(String),

    /// The worker thread terminated abnormally.
    #[error("writer thread panicked")]
    WorkerPanicked,

    /// The writer options are unusable.
    #[error("invalid writer options: {0}")]
    InvalidOptions(String),
}

/// Result type for writer operations.
pub type WriterResult<T> = Result<T, WriterError>;
