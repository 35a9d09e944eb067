//! Movie browsing endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use mrv_common::gateway::{get_record_by_id, SortOrder, TableQuery};
use mrv_common::models::{decode_rows, Movie, Review, TABLE_MOVIES, TABLE_REVIEWS};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ApiError;
use crate::pagination::{calculate_pagination, MOVIES_PAGE_SIZE};
use crate::reviews::{review_counts, search_movies, sort_for_display, top_critic_count, MovieIndex};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MovieListQuery {
    #[serde(default)]
    pub search: String,

    #[serde(default = "default_page")]
    pub page: usize,
}

fn default_page() -> usize {
    1
}

#[derive(Debug, Serialize)]
pub struct MovieListing {
    pub ems_id: String,
    pub title: String,
    pub review_count: usize,
}

#[derive(Debug, Serialize)]
pub struct MovieListResponse {
    pub search: String,
    /// Movies matching the search, across all pages
    pub total_movies: usize,
    /// Reviews across every movie
    pub total_reviews: usize,
    pub page: usize,
    pub total_pages: usize,
    pub movies: Vec<MovieListing>,
}

#[derive(Debug, Serialize)]
pub struct MovieReviewsResponse {
    pub movie_id: String,
    pub title: String,
    pub total: usize,
    pub top_critics: usize,
    pub reviews: Vec<Review>,
}

/// GET /api/movies?search=&page=
pub async fn list_movies(
    State(state): State<AppState>,
    Query(query): Query<MovieListQuery>,
) -> Result<Json<MovieListResponse>, ApiError> {
    let movie_rows = state
        .gateway
        .fetch(TABLE_MOVIES, &TableQuery::new().order_by("title", SortOrder::Ascending))
        .await?;
    let movies: Vec<Movie> = decode_rows(TABLE_MOVIES, movie_rows);

    let review_rows = state
        .gateway
        .fetch(TABLE_REVIEWS, &TableQuery::new().select("review_id,movie_id"))
        .await?;
    let reviews: Vec<Review> = decode_rows(TABLE_REVIEWS, review_rows);
    let counts = review_counts(&reviews);

    let matching = search_movies(&movies, &query.search);
    let pagination = calculate_pagination(matching.len(), query.page, MOVIES_PAGE_SIZE);
    let index = MovieIndex::new(&movies);

    let page = pagination
        .slice(&matching)
        .iter()
        .map(|movie| MovieListing {
            ems_id: movie.ems_id.clone(),
            title: index.title(&movie.ems_id),
            review_count: counts.get(&movie.ems_id).copied().unwrap_or(0),
        })
        .collect();

    Ok(Json(MovieListResponse {
        search: query.search,
        total_movies: matching.len(),
        total_reviews: reviews.len(),
        page: pagination.page,
        total_pages: pagination.total_pages,
        movies: page,
    }))
}

/// GET /api/movies/:id/reviews
///
/// Reviews of one movie, top critics first then newest first. A movie id
/// with no movie row still lists its reviews under a placeholder title.
pub async fn movie_reviews(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> Result<Json<MovieReviewsResponse>, ApiError> {
    let movie: Option<Movie> = get_record_by_id(state.gateway.as_ref(), TABLE_MOVIES, "ems_id", &movie_id)
        .await?
        .and_then(|row| serde_json::from_value(Value::Object(row)).ok());
    let index = MovieIndex::new(movie.as_slice());

    let rows = state
        .gateway
        .fetch(TABLE_REVIEWS, &TableQuery::new().eq("movie_id", movie_id.as_str()))
        .await?;
    let mut reviews: Vec<Review> = decode_rows(TABLE_REVIEWS, rows);
    sort_for_display(&mut reviews);

    Ok(Json(MovieReviewsResponse {
        title: index.title(&movie_id),
        total: reviews.len(),
        top_critics: top_critic_count(&reviews),
        movie_id,
        reviews,
    }))
}
