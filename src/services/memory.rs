use crate::{
    error::{AppError, Result},
    models::{
        note::ProjectNote,
        notification::Notification,
        preferences::{LastCheck, UserPreferences},
        tracking::TrackedProject,
    },
    services::store::DataStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Process-local store used for tests and `DATABASE_MODE=memory`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tracked: DashMap<String, TrackedProject>,
    notifications: DashMap<String, Notification>,
    preferences: DashMap<String, UserPreferences>,
    last_checks: DashMap<String, LastCheck>,
    notes: DashMap<String, ProjectNote>,
    writes: AtomicUsize,
    failing_writes: DashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mutating calls made so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every later write to the document `id` fail with a store error.
    pub fn fail_writes_to(&self, id: &str) {
        self.failing_writes.insert(id.to_string());
    }

    fn check_writable(&self, id: &str) -> Result<()> {
        if self.failing_writes.contains(id) {
            return Err(AppError::Store(format!("write to {} rejected", id)));
        }
        Ok(())
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn list_tracked_projects(&self, user_id: &str) -> Result<Vec<TrackedProject>> {
        let mut tracked: Vec<TrackedProject> = self
            .tracked
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        tracked.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tracked)
    }

    async fn find_tracked_project(&self, user_id: &str, project_id: &str) -> Result<Option<TrackedProject>> {
        Ok(self
            .tracked
            .iter()
            .find(|entry| entry.user_id == user_id && entry.project_id == project_id)
            .map(|entry| entry.value().clone()))
    }

    async fn insert_tracked_project(&self, tracked: &TrackedProject) -> Result<()> {
        self.record_write();
        self.tracked.insert(tracked.doc_id.clone(), tracked.clone());
        Ok(())
    }

    async fn delete_tracked_project(&self, doc_id: &str) -> Result<()> {
        self.record_write();
        self.tracked.remove(doc_id);
        Ok(())
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        self.record_write();
        self.notifications.insert(notification.id.clone(), notification.clone());
        Ok(())
    }

    async fn get_notification(&self, id: &str) -> Result<Option<Notification>> {
        Ok(self.notifications.get(id).map(|entry| entry.value().clone()))
    }

    async fn list_notifications(&self, user_id: &str, unread_only: bool) -> Result<Vec<Notification>> {
        let mut notifications: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|entry| entry.user_id == user_id && (!unread_only || !entry.read))
            .map(|entry| entry.value().clone())
            .collect();
        notifications.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(notifications)
    }

    async fn mark_notification_read(&self, id: &str, read_at: DateTime<Utc>) -> Result<bool> {
        self.record_write();
        self.check_writable(id)?;
        match self.notifications.get_mut(id) {
            Some(mut entry) => {
                entry.read = true;
                entry.read_at = Some(read_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_notification(&self, id: &str) -> Result<bool> {
        self.record_write();
        Ok(self.notifications.remove(id).is_some())
    }

    async fn get_preferences(&self, user_id: &str) -> Result<Option<UserPreferences>> {
        Ok(self.preferences.get(user_id).map(|entry| entry.value().clone()))
    }

    async fn put_preferences(&self, preferences: &UserPreferences) -> Result<()> {
        self.record_write();
        self.preferences.insert(preferences.user_id.clone(), preferences.clone());
        Ok(())
    }

    async fn get_last_check(&self, user_id: &str) -> Result<Option<LastCheck>> {
        Ok(self.last_checks.get(user_id).map(|entry| entry.value().clone()))
    }

    async fn put_last_check(&self, last_check: &LastCheck) -> Result<()> {
        self.record_write();
        self.last_checks.insert(last_check.user_id.clone(), last_check.clone());
        Ok(())
    }

    async fn list_notes(&self, user_id: &str, project_id: &str) -> Result<Vec<ProjectNote>> {
        let mut notes: Vec<ProjectNote> = self
            .notes
            .iter()
            .filter(|entry| entry.user_id == user_id && entry.project_id == project_id)
            .map(|entry| entry.value().clone())
            .collect();
        notes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(notes)
    }

    async fn get_note(&self, id: &str) -> Result<Option<ProjectNote>> {
        Ok(self.notes.get(id).map(|entry| entry.value().clone()))
    }

    async fn put_note(&self, note: &ProjectNote) -> Result<()> {
        self.record_write();
        self.notes.insert(note.id.clone(), note.clone());
        Ok(())
    }

    async fn delete_note(&self, id: &str) -> Result<bool> {
        self.record_write();
        Ok(self.notes.remove(id).is_some())
    }
}
