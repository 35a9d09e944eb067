//! Review source endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use mrv_common::gateway::TableQuery;
use mrv_common::models::{decode_rows, Movie, Review, TABLE_MOVIES, TABLE_REVIEWS};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ApiError;
use crate::reviews::{sort_for_display, top_critic_count, MovieIndex};
use crate::sources::{rank_sources, reviews_from_domain, SourceSummary, DEFAULT_TOP_SOURCES};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SourceListQuery {
    #[serde(default = "default_top")]
    pub top: usize,
}

fn default_top() -> usize {
    DEFAULT_TOP_SOURCES
}

/// Review with the title of the movie it belongs to
#[derive(Debug, Serialize)]
pub struct TitledReview {
    pub movie_title: String,
    #[serde(flatten)]
    pub review: Review,
}

#[derive(Debug, Serialize)]
pub struct SourceReviewsResponse {
    pub domain: String,
    pub publication_name: Option<String>,
    pub total: usize,
    pub top_critics: usize,
    pub reviews: Vec<TitledReview>,
}

/// GET /api/sources?top=
pub async fn list_sources(
    State(state): State<AppState>,
    Query(query): Query<SourceListQuery>,
) -> Result<Json<SourceSummary>, ApiError> {
    let reviews = fetch_all_reviews(&state).await?;
    let summary = SourceSummary::from_ranking(rank_sources(&reviews), query.top);
    debug!(
        sources = summary.total_sources,
        reviews = summary.total_reviews,
        "Ranked review sources"
    );
    Ok(Json(summary))
}

/// GET /api/sources/:domain/reviews
pub async fn source_reviews(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<SourceReviewsResponse>, ApiError> {
    let domain = domain.trim().to_ascii_lowercase();
    let reviews = fetch_all_reviews(&state).await?;

    let mut matching: Vec<Review> = reviews_from_domain(&reviews, &domain)
        .into_iter()
        .cloned()
        .collect();
    let publication_name = matching
        .iter()
        .find_map(|r| r.data.publication_name())
        .map(str::to_string);
    sort_for_display(&mut matching);

    let movie_rows = state.gateway.fetch(TABLE_MOVIES, &TableQuery::new()).await?;
    let movies: Vec<Movie> = decode_rows(TABLE_MOVIES, movie_rows);
    let index = MovieIndex::new(&movies);

    Ok(Json(SourceReviewsResponse {
        domain,
        publication_name,
        total: matching.len(),
        top_critics: top_critic_count(&matching),
        reviews: matching
            .into_iter()
            .map(|review| TitledReview {
                movie_title: index.title(&review.movie_id),
                review,
            })
            .collect(),
    }))
}

pub(crate) async fn fetch_all_reviews(state: &AppState) -> Result<Vec<Review>, ApiError> {
    let rows = state.gateway.fetch(TABLE_REVIEWS, &TableQuery::new()).await?;
    Ok(decode_rows(TABLE_REVIEWS, rows))
}
