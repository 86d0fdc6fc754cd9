pub mod definitions;
pub mod health;
pub mod records;
pub mod settings;
pub mod values;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /values                     current values (GET), override (PUT)
///
/// /records                    list (GET ?limit=), submit (POST)
///
/// /definitions                list with token (GET), replace all (PUT)
/// /definitions/token          change token (GET)
/// /definitions/sync           copy current values into initialValue (POST)
/// /definitions/refresh        advance the change token (POST)
///
/// /settings                   get, merge (GET, PUT)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/values", values::router())
        .nest("/records", records::router())
        .nest("/definitions", definitions::router())
        .nest("/settings", settings::router())
}
