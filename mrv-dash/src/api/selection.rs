//! Selection endpoints
//!
//! The server holds one browse selection. Every change advances its
//! generation; `GET /api/selection/reviews` drops its own result when the
//! selection changed while the reviews were being fetched.

use axum::{extract::State, Json};
use mrv_common::gateway::TableQuery;
use mrv_common::models::{decode_rows, Review, TABLE_REVIEWS};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::sources::fetch_all_reviews;
use super::ApiError;
use crate::reviews::sort_for_display;
use crate::selection::{BrowseMode, Selection, SelectionState};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SelectMovieRequest {
    pub ems_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectSourceRequest {
    pub domain: String,
}

#[derive(Debug, Deserialize)]
pub struct SwitchModeRequest {
    pub mode: BrowseMode,
}

#[derive(Debug, Serialize)]
pub struct SelectedReviewsResponse {
    pub generation: u64,
    pub selection: Selection,
    /// The selection changed before the fetch finished; `reviews` is empty
    pub stale: bool,
    pub reviews: Vec<Review>,
}

/// GET /api/selection
pub async fn get_selection(State(state): State<AppState>) -> Json<SelectionState> {
    Json(state.selection.read().await.clone())
}

/// POST /api/selection/movie
pub async fn select_movie(
    State(state): State<AppState>,
    Json(request): Json<SelectMovieRequest>,
) -> Result<Json<SelectionState>, ApiError> {
    let ems_id = request.ems_id.trim();
    if ems_id.is_empty() {
        return Err(ApiError::BadRequest("ems_id must not be empty".to_string()));
    }
    Ok(Json(apply(&state, |s| s.select_movie(ems_id)).await))
}

/// POST /api/selection/source
pub async fn select_source(
    State(state): State<AppState>,
    Json(request): Json<SelectSourceRequest>,
) -> Result<Json<SelectionState>, ApiError> {
    let domain = request.domain.trim().to_ascii_lowercase();
    if domain.is_empty() {
        return Err(ApiError::BadRequest("domain must not be empty".to_string()));
    }
    Ok(Json(apply(&state, |s| s.select_source(domain)).await))
}

/// POST /api/selection/mode
pub async fn switch_mode(
    State(state): State<AppState>,
    Json(request): Json<SwitchModeRequest>,
) -> Json<SelectionState> {
    Json(apply(&state, |s| s.switch_mode(request.mode)).await)
}

async fn apply(state: &AppState, transition: impl FnOnce(&SelectionState) -> SelectionState) -> SelectionState {
    let mut current = state.selection.write().await;
    let next = transition(&current);
    *current = next;
    info!(
        mode = ?current.mode,
        selection = ?current.selection,
        generation = current.generation,
        "Selection changed"
    );
    current.clone()
}

/// GET /api/selection/reviews
pub async fn selected_reviews(
    State(state): State<AppState>,
) -> Result<Json<SelectedReviewsResponse>, ApiError> {
    let snapshot = state.selection.read().await.clone();

    let fetched = match &snapshot.selection {
        Selection::None => Vec::new(),
        Selection::Movie(ems_id) => {
            let query = TableQuery::new().eq("movie_id", ems_id.as_str());
            let rows = state.gateway.fetch(TABLE_REVIEWS, &query).await?;
            decode_rows(TABLE_REVIEWS, rows)
        }
        Selection::Source(_) => fetch_all_reviews(&state).await?,
    };

    let mut reviews: Vec<Review> = snapshot
        .filter_reviews(&fetched)
        .into_iter()
        .cloned()
        .collect();
    sort_for_display(&mut reviews);

    let stale = !state.selection.read().await.is_current(snapshot.generation);
    if stale {
        debug!(generation = snapshot.generation, "Discarding reviews for superseded selection");
        reviews.clear();
    }

    Ok(Json(SelectedReviewsResponse {
        generation: snapshot.generation,
        selection: snapshot.selection,
        stale,
        reviews,
    }))
}
