//! Error types for the application.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Durable store errors (streams and key-value).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Invalid stream entry id '{id}'")]
    InvalidId { id: String },

    #[error("Store unavailable: {message}")]
    Unavailable { message: String },
}

/// Queue payload schema errors.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Entry {id} does not match the expected shape: {message}")]
    Shape { id: String, message: String },

    #[error("Entry {id} is out of order (cursor at {after})")]
    OutOfOrder { id: String, after: String },

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Relay queue errors.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Malformed queue payload: {0}")]
    Payload(#[from] PayloadError),
}

/// Chat-system (Discord) errors.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Serenity error: {0}")]
    Serenity(#[from] serenity::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Discord returned status {status} for channel {channel_id}")]
    Status { status: u16, channel_id: u64 },

    #[error("Invalid event time {time}")]
    InvalidTimestamp { time: i64 },
}

/// Game-side adapter errors.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Failed to connect to {host}:{port}: {source}")]
    ConnectFailed {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Not connected to the game proxy")]
    NotConnected,

    #[error("Kicked from the server: {reason}")]
    Kicked { reason: String },

    #[error("Frame too long: {len} bytes")]
    FrameTooLong { len: usize },

    #[error("Failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for relay queue operations.
pub type RelayResult<T> = std::result::Result<T, RelayError>;

/// Result type alias for chat-system operations.
pub type ChatResult<T> = std::result::Result<T, ChatError>;
