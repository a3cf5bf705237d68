use crate::{
    error::Result,
    models::project::{ProjectFilterQuery, ProjectListQuery, ProjectUpdatesQuery},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/projects", get(list_projects))
        .route("/projects/filter", get(filter_projects))
        .route("/project/:planning_id", get(get_project))
        .route("/categories", get(get_categories))
        .route("/project-updates", get(get_project_updates))
}

/// GET /api/projects
async fn list_projects(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProjectListQuery>,
) -> Result<Json<Value>> {
    debug!("Listing projects: {:?}", query);

    let page = state.project_service.list_projects(query).await?;

    Ok(Json(json!({
        "status": "success",
        "data": page
    })))
}

/// GET /api/projects/filter
async fn filter_projects(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProjectFilterQuery>,
) -> Result<Json<Value>> {
    debug!("Filtering projects: {:?}", query);

    let page = state.project_service.filter_projects(query).await?;

    Ok(Json(json!({
        "status": "success",
        "data": page
    })))
}

/// GET /api/project/:planning_id
async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(planning_id): Path<String>,
) -> Result<Json<Value>> {
    debug!("Getting project: {}", planning_id);

    let project = state.project_service.get_project(&planning_id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": project
    })))
}

/// GET /api/categories
async fn get_categories(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let categories = state.project_service.categories().await?;

    Ok(Json(json!({
        "status": "success",
        "data": categories
    })))
}

/// GET /api/project-updates?period=
async fn get_project_updates(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProjectUpdatesQuery>,
) -> Result<Json<Value>> {
    debug!("Getting project updates for period {:?}", query.period);

    let updates = state
        .project_service
        .project_updates(query.period.as_deref())
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": updates
    })))
}
