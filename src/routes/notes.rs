use crate::{
    error::Result,
    models::note::{CreateNoteRequest, UpdateNoteRequest},
    state::AppState,
    utils::validation::{validate_planning_id, validate_user_id},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/users/:user_id/projects/:planning_id/notes",
            get(list_notes).post(create_note),
        )
        .route("/notes/:note_id", put(update_note).delete(delete_note))
}

/// GET /api/users/:user_id/projects/:planning_id/notes
async fn list_notes(
    State(state): State<Arc<AppState>>,
    Path((user_id, planning_id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    validate_user_id(&user_id)?;
    validate_planning_id(&planning_id)?;

    let notes = state.note_service.list_notes(&user_id, &planning_id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": notes
    })))
}

/// POST /api/users/:user_id/projects/:planning_id/notes
async fn create_note(
    State(state): State<Arc<AppState>>,
    Path((user_id, planning_id)): Path<(String, String)>,
    Json(request): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    validate_user_id(&user_id)?;
    validate_planning_id(&planning_id)?;
    debug!("Creating note on project {} for user {}", planning_id, user_id);

    let note = state
        .note_service
        .create_note(&user_id, &planning_id, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": note
        })),
    ))
}

/// PUT /api/notes/:note_id
async fn update_note(
    State(state): State<Arc<AppState>>,
    Path(note_id): Path<String>,
    Json(request): Json<UpdateNoteRequest>,
) -> Result<Json<Value>> {
    let note = state.note_service.update_note(&note_id, request).await?;

    Ok(Json(json!({
        "status": "success",
        "data": note
    })))
}

/// DELETE /api/notes/:note_id
async fn delete_note(
    State(state): State<Arc<AppState>>,
    Path(note_id): Path<String>,
) -> Result<Json<Value>> {
    state.note_service.delete_note(&note_id).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Note deleted"
    })))
}
