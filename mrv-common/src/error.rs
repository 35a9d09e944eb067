//! Common error types for MRV

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::storage::StorageError;

/// Common result type for MRV operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across MRV crates
#[derive(Error, Debug)]
pub enum Error {
    /// Table query against the hosted backend failed
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Object storage operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Row could not be decoded into a typed entity
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
