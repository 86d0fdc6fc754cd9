use axum::routing::get;
use axum::Router;

use crate::handlers::records;
use crate::state::AppState;

/// Technical record routes mounted at `/records`.
///
/// ```text
/// GET  /  -> list_records
/// POST /  -> submit_record
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(records::list_records).post(records::submit_record))
}
