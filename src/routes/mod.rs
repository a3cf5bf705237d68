use crate::{state::AppState, utils::middleware::rate_limit_middleware};
use axum::{
    http::{HeaderValue, Method},
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

pub mod notes;
pub mod notifications;
pub mod preferences;
pub mod projects;
pub mod tracking;

/// Full HTTP application: `/health` plus everything under `/api`.
pub fn app(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(projects::router())
        .merge(tracking::router())
        .merge(notifications::router())
        .merge(preferences::router())
        .merge(notes::router());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(cors_layer(&state.config.cors_allowed_origins))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &str) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(origins)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "success",
        "data": {
            "service": "planning-tracker",
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}
