use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::error;

use crate::{
    models::assignment::{AssignDinnerRequest, Assignment, AssignmentQuery, AssignmentSummary},
    routes::internal_error,
    services::assignments::{AssignOutcome, AssignmentService},
    AppState,
};

/// GET /api/assignments?date=YYYY-MM-DD — one assignment or `null`
/// GET /api/assignments?month=YYYY-MM   — every assignment in the month
pub async fn get_assignments(
    State(state): State<AppState>,
    Query(params): Query<AssignmentQuery>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    if let Some(date) = params.date() {
        return AssignmentService::find_by_date(&state.db, date)
            .await
            .map(|assignment| Json(assignment).into_response())
            .map_err(internal_error);
    }

    if let Some(month) = params.month() {
        return AssignmentService::list_for_month(&state.db, month)
            .await
            .map(|assignments| Json(assignments).into_response())
            .map_err(internal_error);
    }

    Err((
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Must provide either date or month parameter" })),
    ))
}

/// POST /api/assignments — 201 for a new day, 200 when the day is reassigned
pub async fn assign_dinner(
    State(state): State<AppState>,
    Json(body): Json<AssignDinnerRequest>,
) -> Result<(StatusCode, Json<Assignment>), (StatusCode, Json<Value>)> {
    match AssignmentService::assign(&state.db, &body).await {
        Ok(AssignOutcome::Created(a)) => Ok((StatusCode::CREATED, Json(a))),
        Ok(AssignOutcome::Reassigned(a)) => Ok((StatusCode::OK, Json(a))),
        Ok(AssignOutcome::DinnerNotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Dinner not found" })),
        )),
        Err(e) => Err(internal_error(e)),
    }
}

/// DELETE /api/assignments?date=YYYY-MM-DD
pub async fn delete_assignments(
    State(state): State<AppState>,
    Query(params): Query<AssignmentQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let Some(date) = params.date() else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Must provide date parameter" })),
        ));
    };

    match AssignmentService::delete_by_date(&state.db, date).await {
        Ok(count) => Ok(Json(json!({
            "success": true,
            "message": format!("Successfully deleted {count} assignments for {date}"),
            "count": count,
        }))),
        Err(e) => {
            error!("Failed to delete assignments for {date}: {e:#}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": format!("Failed to delete assignments: {e}"),
                })),
            ))
        }
    }
}

pub async fn list_all_assignments(
    State(state): State<AppState>,
) -> Result<Json<Vec<AssignmentSummary>>, (StatusCode, Json<Value>)> {
    AssignmentService::list_all(&state.db)
        .await
        .map(Json)
        .map_err(internal_error)
}

/// POST /api/assignments/clear
pub async fn clear_assignments(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match AssignmentService::clear(&state.db).await {
        Ok(count) => Ok(Json(json!({
            "success": true,
            "message": format!("Successfully cleared {count} assignments"),
            "count": count,
        }))),
        Err(e) => {
            error!("Failed to clear assignments: {e:#}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": format!("Failed to clear assignments: {e}"),
                })),
            ))
        }
    }
}
