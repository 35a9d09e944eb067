//! Digest endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use mrv_common::StoredObject;
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::digest::{fetch_breakdown, DigestDocument, DigestReader, TopicSummary};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DigestQuery {
    /// File name of the version to read; latest when absent
    pub version: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DigestVersionsResponse {
    pub movie_id: String,
    pub versions: Vec<StoredObject>,
}

#[derive(Debug, Serialize)]
pub struct BreakdownResponse {
    pub movie_id: String,
    pub topics: Vec<TopicSummary>,
}

/// GET /api/movies/:id/digest/versions
pub async fn list_digest_versions(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> Result<Json<DigestVersionsResponse>, ApiError> {
    let reader = DigestReader::new(state.store.as_ref(), &state.digests);
    let versions = reader.versions(&movie_id).await?;
    Ok(Json(DigestVersionsResponse { movie_id, versions }))
}

/// GET /api/movies/:id/digest?version=
pub async fn get_digest(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
    Query(query): Query<DigestQuery>,
) -> Result<Json<DigestDocument>, ApiError> {
    let reader = DigestReader::new(state.store.as_ref(), &state.digests);
    let document = match query.version {
        Some(version) => reader.content(&movie_id, &version).await?,
        None => reader
            .latest(&movie_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("No digest for movie {}", movie_id)))?,
    };
    Ok(Json(document))
}

/// GET /api/movies/:id/breakdown
pub async fn get_breakdown(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> Result<Json<BreakdownResponse>, ApiError> {
    let topics = fetch_breakdown(state.gateway.as_ref(), &movie_id).await?;
    Ok(Json(BreakdownResponse { movie_id, topics }))
}
