//! mrv-dash library - movie review dashboard service
//!
//! Read-only views over the review ingestion backend: source rankings,
//! movie/source browsing, workflow lineage and history, and digests.

use axum::Router;
use mrv_common::config::{DigestNaming, WorkflowIds};
use mrv_common::{ObjectStore, TableGateway};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod digest;
pub mod history;
pub mod lineage;
pub mod pagination;
pub mod preferences;
pub mod reviews;
pub mod selection;
pub mod sources;

use preferences::DisplayPreferences;
use selection::SelectionState;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Table access to the backend (read-only)
    pub gateway: Arc<dyn TableGateway>,
    /// Digest document storage
    pub store: Arc<dyn ObjectStore>,
    pub workflows: Arc<WorkflowIds>,
    pub digests: Arc<DigestNaming>,
    /// Current browse mode and selection
    pub selection: Arc<RwLock<SelectionState>>,
    pub preferences: DisplayPreferences,
}

impl AppState {
    /// Create new application state with default workflow ids and naming
    pub fn new(gateway: Arc<dyn TableGateway>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            gateway,
            store,
            workflows: Arc::new(WorkflowIds::default()),
            digests: Arc::new(DigestNaming::default()),
            selection: Arc::new(RwLock::new(SelectionState::new())),
            preferences: DisplayPreferences::default(),
        }
    }

    pub fn with_workflows(mut self, workflows: WorkflowIds) -> Self {
        self.workflows = Arc::new(workflows);
        self
    }

    pub fn with_digest_naming(mut self, naming: DigestNaming) -> Self {
        self.digests = Arc::new(naming);
        self
    }

    pub fn with_preferences(mut self, preferences: DisplayPreferences) -> Self {
        self.preferences = preferences;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let api = Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        .route("/api/table/:name", get(api::get_table_data))
        .route("/api/movies", get(api::list_movies))
        .route("/api/movies/:id/reviews", get(api::movie_reviews))
        .route("/api/movies/:id/digest", get(api::get_digest))
        .route("/api/movies/:id/digest/versions", get(api::list_digest_versions))
        .route("/api/movies/:id/breakdown", get(api::get_breakdown))
        .route("/api/sources", get(api::list_sources))
        .route("/api/sources/:domain/reviews", get(api::source_reviews))
        .route("/api/selection", get(api::get_selection))
        .route("/api/selection/movie", post(api::select_movie))
        .route("/api/selection/source", post(api::select_source))
        .route("/api/selection/mode", post(api::switch_mode))
        .route("/api/selection/reviews", get(api::selected_reviews))
        .route("/api/workflows/:kind/executions", get(api::list_executions))
        .route(
            "/api/workflows/:kind/executions/:exec_id/items",
            get(api::execution_items),
        )
        .route(
            "/api/preferences/theme",
            get(api::get_theme).post(api::update_theme),
        );

    Router::new()
        .merge(api)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
