use crate::{
    config::Config,
    error::Result,
    services::{
        BuildingInfoClient, DataStore, NoteService, NotificationService, PreferenceService,
        ProjectService, ProjectUpdateService, TrackingService,
    },
    utils::middleware::{build_rate_limiter, KeyedRateLimiter},
};
use std::sync::Arc;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    /// Document store behind all per-user data.
    pub store: Arc<dyn DataStore>,

    pub project_service: ProjectService,
    pub tracking_service: TrackingService,
    pub notification_service: NotificationService,
    pub update_service: ProjectUpdateService,
    pub preference_service: PreferenceService,
    pub note_service: NoteService,

    pub rate_limiter: Arc<KeyedRateLimiter>,
}

impl AppState {
    /// Wires every service against `store` and a BuildingInfo client built
    /// from `config`.
    pub fn new(config: Config, store: Arc<dyn DataStore>) -> Result<Self> {
        let client = Arc::new(BuildingInfoClient::new(&config)?);

        Ok(Self {
            project_service: ProjectService::new(client.clone(), &config),
            tracking_service: TrackingService::new(store.clone()),
            notification_service: NotificationService::new(store.clone()),
            update_service: ProjectUpdateService::new(store.clone(), client, config.gbp_to_eur_rate),
            preference_service: PreferenceService::new(store.clone()),
            note_service: NoteService::new(store.clone()),
            rate_limiter: Arc::new(build_rate_limiter(config.rate_limit_requests)),
            store,
            config,
        })
    }
}
