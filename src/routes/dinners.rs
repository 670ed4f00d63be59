use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::{
    models::dinner::{CreateDinnerRequest, Dinner, UpdateDinnerRequest},
    routes::internal_error,
    services::dinners::DinnerService,
    AppState,
};

fn dinner_not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Dinner not found" })))
}

/// GET /api/dinners — seeds the example catalog on first read of an empty store
pub async fn list_dinners(
    State(state): State<AppState>,
) -> Result<Json<Vec<Dinner>>, (StatusCode, Json<Value>)> {
    DinnerService::list_or_seed(&state.db)
        .await
        .map(Json)
        .map_err(internal_error)
}

pub async fn create_dinner(
    State(state): State<AppState>,
    Json(body): Json<CreateDinnerRequest>,
) -> Result<(StatusCode, Json<Dinner>), (StatusCode, Json<Value>)> {
    if body.name().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Name required" })),
        ));
    }

    DinnerService::create(&state.db, &body)
        .await
        .map(|dinner| (StatusCode::CREATED, Json(dinner)))
        .map_err(internal_error)
}

/// PUT /api/dinners/{id} — partial update, absent fields are left unchanged
pub async fn update_dinner(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateDinnerRequest>,
) -> Result<Json<Dinner>, (StatusCode, Json<Value>)> {
    match DinnerService::update(&state.db, id, &body).await {
        Ok(Some(dinner)) => Ok(Json(dinner)),
        Ok(None) => Err(dinner_not_found()),
        Err(e) => Err(internal_error(e)),
    }
}

/// DELETE /api/dinners/{id} — removes the dinner's assignments, then the dinner
pub async fn delete_dinner(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match DinnerService::delete(&state.db, id).await {
        Ok(Some(assignments)) => {
            info!("Deleted dinner {id} and {assignments} assignment(s)");
            Ok(Json(json!({
                "success": true,
                "message": "Dinner and its assignments successfully deleted",
            })))
        }
        Ok(None) => Err(dinner_not_found()),
        Err(e) => {
            error!("Failed to delete dinner {id}: {e:#}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": format!("Failed to delete dinner: {e}"),
                })),
            ))
        }
    }
}
