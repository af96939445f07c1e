//! Cache error types

use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Operation error: {0}")]
    Operation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(error: redis::RedisError) -> Self {
        if error.is_connection_refusal() || error.is_connection_dropped() {
            CacheError::Connection(error.to_string())
        } else {
            CacheError::Operation(error.to_string())
        }
    }
}
