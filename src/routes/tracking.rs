use crate::{
    error::Result,
    models::tracking::TrackProjectRequest,
    state::AppState,
    utils::validation::validate_user_id,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/projects/track", post(track_project))
        .route("/users/:user_id/tracked", get(list_tracked))
        .route("/users/:user_id/tracked/:planning_id", delete(untrack_project))
}

/// POST /api/projects/track
async fn track_project(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TrackProjectRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    debug!("Track request for project {} by user {}", request.planning_id, request.user_id);

    let tracked = state.tracking_service.track_project(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": tracked,
            "message": "Project tracked successfully"
        })),
    ))
}

/// GET /api/users/:user_id/tracked
async fn list_tracked(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>> {
    let tracked = state.tracking_service.list_tracked_projects(&user_id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": tracked
    })))
}

/// DELETE /api/users/:user_id/tracked/:planning_id
async fn untrack_project(
    State(state): State<Arc<AppState>>,
    Path((user_id, planning_id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    debug!("Untracking project {} for user {}", planning_id, user_id);
    validate_user_id(&user_id)?;

    state
        .tracking_service
        .untrack_project(&user_id, &planning_id)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Project untracked successfully"
    })))
}
