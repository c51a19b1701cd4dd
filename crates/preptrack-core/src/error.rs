//! Error types for preptrack-core

use thiserror::Error;

/// Result type alias using preptrack-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in preptrack-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// `SQLite` error from the local store
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Stored or received payload did not match the record schema
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
