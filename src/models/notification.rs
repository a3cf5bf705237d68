use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub read: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn new(
        user_id: &str,
        project_id: &str,
        title: &str,
        message: String,
        notification_type: NotificationType,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            project_id: project_id.to_string(),
            title: title.to_string(),
            message,
            notification_type,
            read: false,
            timestamp: Utc::now(),
            read_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    StatusChange,
    ValueChange,
    DocumentUpdate,
    ProjectUpdate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationListQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateRangeRequest {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MarkAllResult {
    pub updated: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let n = Notification::new("u1", "42", "Depot", "Status changed".into(), NotificationType::StatusChange);
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["type"], "status_change");
        assert_eq!(value["read"], false);
        assert!(value["read_at"].is_null());
    }
}
