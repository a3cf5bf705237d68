use std::{net::SocketAddr, sync::Arc};
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use planning_tracker::{
    config::{Config, DatabaseMode},
    routes,
    services::{DataStore, Database, MemoryStore},
    state::AppState,
};

/// How often expired response-cache entries are swept.
const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    init_tracing(&config);

    info!("Starting planning-tracker service ({} environment)...", config.environment);

    let store: Arc<dyn DataStore> = match config.database_mode {
        DatabaseMode::Memory => {
            info!("Using in-memory document store");
            Arc::new(MemoryStore::new())
        }
        DatabaseMode::Surreal => {
            let db = match Database::new(&config).await {
                Ok(db) => db,
                Err(e) => {
                    error!("Failed to create database connection: {}", e);
                    return Err(anyhow::anyhow!("Database initialization failed"));
                }
            };
            db.verify_connection().await?;
            info!("Database connection established successfully");
            Arc::new(db)
        }
    };

    if !config.has_api_credentials() {
        warn!("BuildingInfo API credentials are not set; project data and update checks are disabled");
    }

    let app_state = Arc::new(AppState::new(config.clone(), store)?);

    start_background_tasks(app_state.clone()).await;

    let app = routes::app(app_state);

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    info!("Starting server on http://{}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::new(if config.log_level.contains('=') {
        config.log_level.clone()
    } else {
        format!("planning_tracker={},tower_http={}", config.log_level, config.log_level)
    });

    if config.log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn start_background_tasks(app_state: Arc<AppState>) {
    info!("Starting background tasks...");

    let cache_state = app_state.clone();
    tokio::spawn(async move {
        let mut interval = interval(CACHE_SWEEP_INTERVAL);

        loop {
            interval.tick().await;
            let purged = cache_state.project_service.purge_expired_cache();
            if purged > 0 {
                debug!("Purged {} expired cache entries", purged);
            }
        }
    });

    info!("Background tasks started successfully");
}
