//! Error types for sprintlens-core

use thiserror::Error;

/// Main error type for the sprintlens-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error (snapshot document level)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot could not be loaded or decoded as a whole
    #[error("snapshot error in {path}: {message}")]
    Snapshot { path: String, message: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for sprintlens-core
pub type Result<T> = std::result::Result<T, Error>;
