use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

/// GET /health — liveness plus a read against the dinners table
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let dinners = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM dinners")
        .fetch_one(&state.db)
        .await;

    match dinners {
        Ok(count) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "db": "connected", "dinners": count })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "error", "db": e.to_string() })),
        ),
    }
}
