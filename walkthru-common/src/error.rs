//! Common error types for walkthru

use thiserror::Error;

/// Common result type for walkthru operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the player and its hosts
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Playlist manifest could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Hotspot region outside the percentage viewport
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
