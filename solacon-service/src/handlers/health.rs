use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

/// Liveness plus whether the generator executable is currently on disk.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let generator = if state.generator.is_available().await {
        "available"
    } else {
        "missing"
    };

    Json(json!({
        "status": "ok",
        "service": "solacon-service",
        "version": env!("CARGO_PKG_VERSION"),
        "generator": generator
    }))
}
