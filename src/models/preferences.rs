use crate::models::period::UpdatePeriod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: String,
    #[serde(default, alias = "checkPeriod")]
    pub check_period: UpdatePeriod,
    #[serde(default)]
    pub email_notifications: bool,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl UserPreferences {
    pub fn defaults_for(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            check_period: UpdatePeriod::default(),
            email_notifications: false,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePreferencesRequest {
    pub check_period: Option<String>,
    pub email_notifications: Option<bool>,
}

/// When a user's update check last completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastCheck {
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_check_period_is_read() {
        let prefs: UserPreferences = serde_json::from_value(json!({
            "user_id": "u1",
            "checkPeriod": "0.7"
        }))
        .unwrap();
        assert_eq!(prefs.check_period, UpdatePeriod::LastWeek);
        assert!(!prefs.email_notifications);
    }

    #[test]
    fn test_missing_check_period_defaults_to_today() {
        let prefs: UserPreferences = serde_json::from_value(json!({ "user_id": "u1" })).unwrap();
        assert_eq!(prefs.check_period, UpdatePeriod::Today);
    }
}
