use crate::{
    error::Result,
    models::{
        note::ProjectNote,
        notification::Notification,
        preferences::{LastCheck, UserPreferences},
        tracking::TrackedProject,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Per-user documents: tracked projects, notes, preferences, notifications
/// and the last-check watermark.
///
/// Every method is a single independent write or query; nothing here spans
/// documents atomically.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn list_tracked_projects(&self, user_id: &str) -> Result<Vec<TrackedProject>>;
    async fn find_tracked_project(&self, user_id: &str, project_id: &str) -> Result<Option<TrackedProject>>;
    async fn insert_tracked_project(&self, tracked: &TrackedProject) -> Result<()>;
    async fn delete_tracked_project(&self, doc_id: &str) -> Result<()>;

    async fn insert_notification(&self, notification: &Notification) -> Result<()>;
    async fn get_notification(&self, id: &str) -> Result<Option<Notification>>;
    /// Newest first.
    async fn list_notifications(&self, user_id: &str, unread_only: bool) -> Result<Vec<Notification>>;
    /// Returns false when the notification does not exist.
    async fn mark_notification_read(&self, id: &str, read_at: DateTime<Utc>) -> Result<bool>;
    async fn delete_notification(&self, id: &str) -> Result<bool>;

    async fn get_preferences(&self, user_id: &str) -> Result<Option<UserPreferences>>;
    async fn put_preferences(&self, preferences: &UserPreferences) -> Result<()>;

    async fn get_last_check(&self, user_id: &str) -> Result<Option<LastCheck>>;
    async fn put_last_check(&self, last_check: &LastCheck) -> Result<()>;

    /// Oldest first.
    async fn list_notes(&self, user_id: &str, project_id: &str) -> Result<Vec<ProjectNote>>;
    async fn get_note(&self, id: &str) -> Result<Option<ProjectNote>>;
    async fn put_note(&self, note: &ProjectNote) -> Result<()>;
    async fn delete_note(&self, id: &str) -> Result<bool>;
}
