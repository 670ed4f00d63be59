pub mod assignments;
pub mod dinners;
pub mod health;
pub mod metrics;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::AppState;

/// Maps an unexpected service failure to a 500 `{error}` body.
pub(crate) fn internal_error(e: anyhow::Error) -> (StatusCode, Json<Value>) {
    error!("Request failed: {e:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
}

/// GET /
pub async fn home() -> Json<Value> {
    Json(json!({ "message": "Dinnerfy backend is running!" }))
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

/// Every origin is accepted. Credentials are allowed too, which rules out a
/// literal `*`, so the request origin is echoed back instead.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // Dinners
        .route("/dinners", get(dinners::list_dinners).post(dinners::create_dinner))
        .route("/dinners/{id}", put(dinners::update_dinner).delete(dinners::delete_dinner))
        // Assignments
        .route(
            "/assignments",
            get(assignments::get_assignments)
                .post(assignments::assign_dinner)
                .delete(assignments::delete_assignments),
        )
        .route("/assignments/all", get(assignments::list_all_assignments))
        .route("/assignments/clear", post(assignments::clear_assignments));

    Router::new()
        .route("/", get(home))
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        .nest("/api", api)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(state)
}
