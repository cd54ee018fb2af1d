//! Usher error types

use thiserror::Error;

/// Usher error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Webhook caller presented a wrong or missing secret
    #[error("Unauthorized")]
    Unauthorized,

    /// The room has no session on the provider
    #[error("No session for room: {0}")]
    SessionNotFound(String),

    /// A session for the room already existed at create time
    #[error("Session already exists for room: {0}")]
    SessionConflict(String),

    /// Connection id not present in the session
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    /// Command name outside the dispatch table
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Session provider returned something unusable
    #[error("Provider error: {0}")]
    Upstream(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport error talking to the session provider
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Cache transport error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),
}

/// Result type alias for usher operations
pub type Result<T> = std::result::Result<T, Error>;
