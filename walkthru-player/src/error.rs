//! Error types for walkthru-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for walkthru-player
#[derive(Error, Debug)]
pub enum Error {
    /// Engine refused to start: the playlist has no clips
    #[error("Playlist contains no clips")]
    EmptySequence,

    /// Loading a clip into a slot failed (recovered locally, slot left empty)
    #[error("Preload of clip {clip_index} failed: {message}")]
    PreloadFailure { clip_index: usize, message: String },

    /// Starting the standby slot failed (forces an immediate commit)
    #[error("Starting clip {clip_index} failed: {message}")]
    TransitionStartFailure { clip_index: usize, message: String },

    /// Media surface operation errors
    #[error("Surface error: {0}")]
    Surface(String),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed host input line
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

/// Convenience Result type using walkthru-player Error
pub type Result<T> = std::result::Result<T, Error>;
