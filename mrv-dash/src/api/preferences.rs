//! Theme preference endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::preferences::Theme;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    pub theme: Theme,
}

/// Body of `POST /api/preferences/theme`; no theme means toggle
#[derive(Debug, Default, Deserialize)]
pub struct ThemeUpdate {
    #[serde(default)]
    pub theme: Option<Theme>,
}

/// GET /api/preferences/theme
pub async fn get_theme(State(state): State<AppState>) -> Json<ThemeResponse> {
    Json(ThemeResponse {
        theme: state.preferences.theme(),
    })
}

/// POST /api/preferences/theme
pub async fn update_theme(
    State(state): State<AppState>,
    Json(update): Json<ThemeUpdate>,
) -> Result<Json<ThemeResponse>, ApiError> {
    let theme = match update.theme {
        Some(theme) => state.preferences.set_theme(theme)?,
        None => state.preferences.toggle_theme()?,
    };
    Ok(Json(ThemeResponse { theme }))
}
