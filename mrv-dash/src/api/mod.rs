//! HTTP API handlers for mrv-dash
//!
//! Every view is an independent JSON endpoint. A failing view answers with an
//! `{"error": ...}` body and leaves the others untouched.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mrv_common::{Error, GatewayError, StorageError};
use serde_json::json;
use tracing::warn;

pub mod buildinfo;
pub mod digests;
pub mod health;
pub mod movies;
pub mod preferences;
pub mod selection;
pub mod sources;
pub mod table;
pub mod workflows;

pub use buildinfo::get_build_info;
pub use digests::{get_breakdown, get_digest, list_digest_versions};
pub use health::health_routes;
pub use movies::{list_movies, movie_reviews};
pub use preferences::{get_theme, update_theme};
pub use selection::{get_selection, select_movie, select_source, selected_reviews, switch_mode};
pub use sources::{list_sources, source_reviews};
pub use table::get_table_data;
pub use workflows::{execution_items, list_executions};

/// API errors
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// Backend or storage failure
    Upstream(String),
    Internal(String),
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::InvalidIdentifier(_) => ApiError::BadRequest(e.to_string()),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(path) => ApiError::NotFound(format!("Object not found: {}", path)),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::Gateway(e) => e.into(),
            Error::Storage(e) => e.into(),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Upstream(msg) => {
                warn!(error = %msg, "View failed to load");
                (StatusCode::BAD_GATEWAY, msg)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
