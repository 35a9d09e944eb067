//! Generic table query gateway
//!
//! Translates a (table, filters, ordering, pagination) request into a call
//! against the hosted backend. Filters are equality predicates, all ANDed.
//! Range, OR and full-text conditions are not supported: callers fetch a
//! broader set and filter locally.
//!
//! Failures come back as `GatewayError` values; nothing is retried.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

mod memory;
mod query;
mod rest;

pub use memory::MemoryGateway;
pub use query::{SortOrder, TableQuery};
pub use rest::RestGateway;

/// One row as returned by the backend
pub type Row = serde_json::Map<String, Value>;

/// Columns reported when a table is empty or unreachable
pub const FALLBACK_COLUMNS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Gateway failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GatewayError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend error {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Read access to backend tables
#[async_trait]
pub trait TableGateway: Send + Sync {
    /// Fetch all rows of `table` matching `query`
    ///
    /// Absence of a limit means every matching row is returned.
    async fn fetch(&self, table: &str, query: &TableQuery) -> Result<Vec<Row>, GatewayError>;
}

/// Fetch a single record by its identifier column
pub async fn get_record_by_id(
    gateway: &dyn TableGateway,
    table: &str,
    id_column: &str,
    id: &str,
) -> Result<Option<Row>, GatewayError> {
    let query = TableQuery::new().eq(id_column, id).limit(1);
    let mut rows = gateway.fetch(table, &query).await?;
    Ok(if rows.is_empty() {
        None
    } else {
        Some(rows.swap_remove(0))
    })
}

/// Column names of a table, inferred from its first row
///
/// Empty or failing tables report `FALLBACK_COLUMNS`.
pub async fn table_columns(gateway: &dyn TableGateway, table: &str) -> Vec<String> {
    match gateway.fetch(table, &TableQuery::new().limit(1)).await {
        Ok(rows) => match rows.first() {
            Some(row) => row.keys().cloned().collect(),
            None => fallback_columns(),
        },
        Err(e) => {
            tracing::warn!(table = %table, error = %e, "Failed to infer table columns");
            fallback_columns()
        }
    }
}

fn fallback_columns() -> Vec<String> {
    FALLBACK_COLUMNS.iter().map(|c| c.to_string()).collect()
}

/// Validate a table or column name before it reaches the backend
///
/// Only ASCII alphanumerics and underscore are allowed.
pub fn validate_identifier(name: &str) -> Result<(), GatewayError> {
    let valid = !name.is_empty()
        && name.len() < 100
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(GatewayError::InvalidIdentifier(name.to_string()))
    }
}
