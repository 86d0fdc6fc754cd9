use axum::routing::get;
use axum::Router;

use crate::handlers::values;
use crate::state::AppState;

/// Gauge value routes mounted at `/values`.
///
/// ```text
/// GET /  -> get_values
/// PUT /  -> override_values
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(values::get_values).put(values::override_values))
}
