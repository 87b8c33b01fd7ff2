//! Default application routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::app::AppState;

/// Builds the application's router from its state.
pub type RouteFactory = fn(AppState) -> Router;

/// The stock router: just a health probe.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state)
}

/// 200 when the database answers, 503 otherwise. Reports the bound address
/// so a caller can tell which instance answered.
async fn health(State(state): State<AppState>) -> Response {
    match state.db.simple_query("SELECT 1").await {
        Ok(_) => Json(json!({
            "status": "ok",
            "addr": state.addr.to_string(),
        }))
        .into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "error",
                "addr": state.addr.to_string(),
                "error": e.to_string(),
            })),
        )
            .into_response(),
    }
}
