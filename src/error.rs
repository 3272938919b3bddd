//! Common error types for interlog

use thiserror::Error;

/// Common result type for interlog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by construction and configuration paths.
///
/// Recording and flushing never return errors: delivery failure is absorbed
/// internally so telemetry can never break the embedding application.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction error (wraps reqwest::Error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
