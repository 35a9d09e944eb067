//! Object storage access
//!
//! Only two operations are consumed: list objects under a folder prefix and
//! download one object as text. Digest documents live under `{movie_id}/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

mod memory;
mod rest;

pub use memory::MemoryObjectStore;
pub use rest::RestObjectStore;

/// Maximum number of objects requested per listing
pub const LIST_LIMIT: usize = 200;

/// Object storage failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage error {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Listed object metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredObject {
    /// File name relative to the listed folder
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Read access to one storage bucket
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List objects directly under `folder`
    async fn list(&self, folder: &str) -> Result<Vec<StoredObject>, StorageError>;

    /// Download `path` (folder/name) as UTF-8 text
    async fn download_text(&self, path: &str) -> Result<String, StorageError>;
}
