//! Common error types for the jukebox crates

use thiserror::Error;

/// Common result type for jukebox operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the jukebox crates
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input to a queue operation (rejected synchronously,
    /// no job created, no registry mutation)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Playback backend failure mid-sound (not retried; the affected
    /// job terminates and deregisters itself)
    #[error("Playback backend error: {0}")]
    Backend(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
