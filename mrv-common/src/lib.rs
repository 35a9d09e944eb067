//! # MRV Common Library
//!
//! Shared code for the movie-review dashboard including:
//! - Typed entity models (movies, reviews, workflow executions, digests)
//! - Generic table query gateway over the hosted backend
//! - Object storage access for digest documents
//! - Configuration loading
//! - Error types

pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod storage;

pub use error::{Error, Result};
pub use gateway::{GatewayError, Row, TableGateway, TableQuery};
pub use storage::{ObjectStore, StorageError, StoredObject};
