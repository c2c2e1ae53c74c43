//! Error types for the event tracking pipeline.

use thiserror::Error;

/// Queue store errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Failed to serialize queue contents: {0}")]
    Serialization(String),
}

/// Errors raised by transports while delivering events
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network failure or non-200 response. Retryable.
    #[error("Transport send error: {0}")]
    Send(String),

    #[error("Transport not usable: {0}")]
    Unusable(String),

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: usize,
        last: Box<TransportError>,
    },

    #[error("Retry window of {elapsed_ms}ms exceeded: {last}")]
    RetryWindowElapsed {
        elapsed_ms: u64,
        last: Box<TransportError>,
    },

    #[error("Queue error: {0}")]
    Queue(String),
}

impl TransportError {
    /// Only send errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Send(_))
    }
}

/// Top-level tracker errors
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Transport error: {0}")]
    TransportError(#[from] TransportError),
}

impl From<config::ConfigError> for TrackerError {
    fn from(err: config::ConfigError) -> Self {
        TrackerError::ConfigError(err.to_string())
    }
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
