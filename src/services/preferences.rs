use crate::{
    error::{AppError, Result},
    models::{
        period::UpdatePeriod,
        preferences::{UpdatePreferencesRequest, UserPreferences},
    },
    services::store::DataStore,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct PreferenceService {
    store: Arc<dyn DataStore>,
}

impl PreferenceService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Stored preferences, or the defaults when the user has none yet.
    pub async fn get_preferences(&self, user_id: &str) -> Result<UserPreferences> {
        Ok(self
            .store
            .get_preferences(user_id)
            .await?
            .unwrap_or_else(|| UserPreferences::defaults_for(user_id)))
    }

    pub async fn update_preferences(
        &self,
        user_id: &str,
        request: UpdatePreferencesRequest,
    ) -> Result<UserPreferences> {
        debug!("Updating preferences for user {}", user_id);

        let mut preferences = self.get_preferences(user_id).await?;

        if let Some(code) = request.check_period {
            preferences.check_period = UpdatePeriod::from_setting(&code)
                .ok_or_else(|| AppError::validation(&format!("Unknown check period: {}", code)))?;
        }
        if let Some(enabled) = request.email_notifications {
            preferences.email_notifications = enabled;
        }
        preferences.updated_at = Utc::now();

        self.store.put_preferences(&preferences).await?;
        info!("Preferences saved for user {} (period {})", user_id, preferences.check_period);
        Ok(preferences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::MemoryStore;

    #[tokio::test]
    async fn test_defaults_without_writing() {
        let store = Arc::new(MemoryStore::new());
        let service = PreferenceService::new(store.clone());

        let prefs = service.get_preferences("u1").await.unwrap();
        assert_eq!(prefs.check_period, UpdatePeriod::Today);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_update_accepts_legacy_codes() {
        let service = PreferenceService::new(Arc::new(MemoryStore::new()));

        let prefs = service
            .update_preferences(
                "u1",
                UpdatePreferencesRequest {
                    check_period: Some("0.7".into()),
                    email_notifications: Some(true),
                },
            )
            .await
            .unwrap();
        assert_eq!(prefs.check_period, UpdatePeriod::LastWeek);
        assert!(prefs.email_notifications);

        let stored = service.get_preferences("u1").await.unwrap();
        assert_eq!(stored.check_period, UpdatePeriod::LastWeek);
    }

    #[tokio::test]
    async fn test_update_rejects_unknown_period() {
        let service = PreferenceService::new(Arc::new(MemoryStore::new()));
        let err = service
            .update_preferences(
                "u1",
                UpdatePreferencesRequest {
                    check_period: Some("fortnightly".into()),
                    email_notifications: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
