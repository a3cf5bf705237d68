use crate::{
    error::{AppError, Result},
    models::notification::{MarkAllResult, Notification},
    services::store::DataStore,
};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn DataStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Newest first, optionally unread only and truncated to `limit`.
    pub async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: Option<usize>,
    ) -> Result<Vec<Notification>> {
        debug!("Listing notifications for user {} (unread_only={})", user_id, unread_only);

        let mut notifications = self.store.list_notifications(user_id, unread_only).await?;
        if let Some(limit) = limit {
            notifications.truncate(limit);
        }
        Ok(notifications)
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<usize> {
        Ok(self.store.list_notifications(user_id, true).await?.len())
    }

    pub async fn mark_notification_as_read(&self, id: &str) -> Result<Notification> {
        debug!("Marking notification {} as read", id);

        if !self.store.mark_notification_read(id, Utc::now()).await? {
            return Err(AppError::not_found("Notification"));
        }

        self.store
            .get_notification(id)
            .await?
            .ok_or_else(|| AppError::not_found("Notification"))
    }

    /// Marks every unread notification of `user_id` with independent
    /// concurrent writes. There is no transaction: when some writes fail the
    /// others stay applied and the failure count is reported as an error.
    pub async fn mark_all_notifications_as_read(&self, user_id: &str) -> Result<MarkAllResult> {
        let unread = self.store.list_notifications(user_id, true).await?;
        if unread.is_empty() {
            return Ok(MarkAllResult::default());
        }

        let read_at = Utc::now();
        let results = join_all(
            unread
                .iter()
                .map(|notification| self.store.mark_notification_read(&notification.id, read_at)),
        )
        .await;

        let mut updated = 0;
        let mut failed = 0;
        for (notification, result) in unread.iter().zip(results) {
            match result {
                Ok(true) => updated += 1,
                // Deleted concurrently; nothing left to mark.
                Ok(false) => {}
                Err(e) => {
                    warn!("Failed to mark notification {} as read: {}", notification.id, e);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(AppError::Store(format!(
                "{} of {} notifications could not be marked as read",
                failed,
                unread.len()
            )));
        }

        info!("Marked {} notifications as read for user {}", updated, user_id);
        Ok(MarkAllResult { updated })
    }

    pub async fn delete_notification(&self, id: &str) -> Result<()> {
        if !self.store.delete_notification(id).await? {
            return Err(AppError::not_found("Notification"));
        }
        info!("Deleted notification {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notification::NotificationType;
    use crate::services::memory::MemoryStore;

    async fn seeded() -> (Arc<MemoryStore>, NotificationService, Vec<String>) {
        let store = Arc::new(MemoryStore::new());
        let mut ids = Vec::new();
        for (i, user) in ["u1", "u1", "u1", "u2"].iter().enumerate() {
            let mut n = Notification::new(
                user,
                &format!("{}", 100 + i),
                "Depot",
                "Project status changed to: Tender".into(),
                NotificationType::StatusChange,
            );
            n.timestamp = n.timestamp + chrono::Duration::seconds(i as i64);
            ids.push(n.id.clone());
            store.insert_notification(&n).await.unwrap();
        }
        let service = NotificationService::new(store.clone());
        (store, service, ids)
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_limited() {
        let (_, service, ids) = seeded().await;
        let listed = service.list_notifications("u1", false, Some(2)).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, ids[2]);
        assert_eq!(listed[1].id, ids[1]);
    }

    #[tokio::test]
    async fn test_mark_all_reports_partial_failure() {
        let (store, service, ids) = seeded().await;
        store.fail_writes_to(&ids[1]);

        let err = service.mark_all_notifications_as_read("u1").await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
        assert!(err.to_string().contains("1 of 3"));

        assert!(store.get_notification(&ids[0]).await.unwrap().unwrap().read);
        assert!(store.get_notification(&ids[2]).await.unwrap().unwrap().read);
        let failed = store.get_notification(&ids[1]).await.unwrap().unwrap();
        assert!(!failed.read);
        assert!(failed.read_at.is_none());
        assert_eq!(service.unread_count("u1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mark_single_as_read() {
        let (_, service, ids) = seeded().await;
        let marked = service.mark_notification_as_read(&ids[0]).await.unwrap();
        assert!(marked.read);
        assert!(marked.read_at.is_some());
        assert_eq!(service.unread_count("u1").await.unwrap(), 2);

        let err = service.mark_notification_as_read("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_mark_all_leaves_nothing_unread() {
        let (_, service, _) = seeded().await;
        let result = service.mark_all_notifications_as_read("u1").await.unwrap();
        assert_eq!(result.updated, 3);
        assert_eq!(service.unread_count("u1").await.unwrap(), 0);
        assert_eq!(service.unread_count("u2").await.unwrap(), 1);

        let again = service.mark_all_notifications_as_read("u1").await.unwrap();
        assert_eq!(again.updated, 0);
    }

    #[tokio::test]
    async fn test_delete_notification() {
        let (_, service, ids) = seeded().await;
        service.delete_notification(&ids[3]).await.unwrap();
        assert!(service.list_notifications("u2", false, None).await.unwrap().is_empty());
        assert!(matches!(
            service.delete_notification(&ids[3]).await,
            Err(AppError::NotFound(_))
        ));
    }
}
