//! Handlers for general dashboard settings.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use gaugewatch_core::settings::SettingsPatch;
use serde_json::Value;

use crate::error::AppResult;
use crate::handlers::typed_body;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/settings
pub async fn get_settings(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let settings = state.settings.get()?;

    Ok(Json(DataResponse { data: settings }))
}

/// PUT /api/v1/settings
///
/// Merge the supplied fields into the current settings.
pub async fn update_settings(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let patch: SettingsPatch = typed_body(body)?;

    let settings = state.settings.merge(patch)?;

    tracing::info!(
        theme = %settings.theme,
        language = %settings.language,
        "Dashboard settings updated",
    );

    Ok(Json(DataResponse { data: settings }))
}
