use crate::{
    error::Result,
    models::preferences::UpdatePreferencesRequest,
    state::AppState,
    utils::validation::validate_user_id,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/users/:user_id/preferences",
        get(get_preferences).put(update_preferences),
    )
}

/// GET /api/users/:user_id/preferences
async fn get_preferences(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>> {
    validate_user_id(&user_id)?;

    let preferences = state.preference_service.get_preferences(&user_id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": preferences
    })))
}

/// PUT /api/users/:user_id/preferences
async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(request): Json<UpdatePreferencesRequest>,
) -> Result<Json<Value>> {
    validate_user_id(&user_id)?;

    let preferences = state
        .preference_service
        .update_preferences(&user_id, request)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": preferences,
        "message": "Preferences updated"
    })))
}
