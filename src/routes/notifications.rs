use crate::{
    error::Result,
    models::notification::{DateRangeRequest, NotificationListQuery},
    state::AppState,
    utils::validation::{validate_date_range, validate_user_id},
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/:user_id/notifications", get(list_notifications))
        .route("/users/:user_id/notifications/unread-count", get(unread_count))
        .route("/users/:user_id/notifications/check", post(check_updates))
        .route("/users/:user_id/notifications/check-range", post(check_date_range))
        .route("/users/:user_id/notifications/read-all", put(mark_all_read))
        .route("/notifications/:id/read", put(mark_read))
        .route("/notifications/:id", delete(delete_notification))
}

/// GET /api/users/:user_id/notifications
async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<Value>> {
    validate_user_id(&user_id)?;

    let notifications = state
        .notification_service
        .list_notifications(&user_id, query.unread_only, query.limit)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": notifications
    })))
}

/// GET /api/users/:user_id/notifications/unread-count
async fn unread_count(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>> {
    validate_user_id(&user_id)?;

    let count = state.notification_service.unread_count(&user_id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": { "count": count }
    })))
}

/// POST /api/users/:user_id/notifications/check
///
/// Failures inside the check are logged and reported as zero created.
async fn check_updates(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>> {
    validate_user_id(&user_id)?;
    debug!("Running update check for user {}", user_id);

    let created = state.update_service.check_for_project_updates(&user_id).await;

    Ok(Json(json!({
        "status": "success",
        "data": { "created": created }
    })))
}

/// POST /api/users/:user_id/notifications/check-range
async fn check_date_range(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(request): Json<DateRangeRequest>,
) -> Result<Json<Value>> {
    validate_user_id(&user_id)?;
    let (start, end) = validate_date_range(&request.start_date, &request.end_date)?;
    debug!("Running date-range check {}..{} for user {}", start, end, user_id);

    let created = state
        .update_service
        .updates_for_date_range(&user_id, start, end)
        .await;

    Ok(Json(json!({
        "status": "success",
        "data": { "created": created }
    })))
}

/// PUT /api/users/:user_id/notifications/read-all
async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>> {
    validate_user_id(&user_id)?;

    let result = state
        .notification_service
        .mark_all_notifications_as_read(&user_id)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": result
    })))
}

/// PUT /api/notifications/:id/read
async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let notification = state.notification_service.mark_notification_as_read(&id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": notification
    })))
}

/// DELETE /api/notifications/:id
async fn delete_notification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state.notification_service.delete_notification(&id).await?;
    info!("Notification {} deleted via API", id);

    Ok(Json(json!({
        "status": "success",
        "message": "Notification deleted"
    })))
}
