use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    note::ProjectNote,
    notification::Notification,
    preferences::{LastCheck, UserPreferences},
    tracking::TrackedProject,
};
use crate::services::store::DataStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use surrealdb::engine::remote::http::{Client, Http, Https};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tracing::{debug, error, info};

const TRACKED_PROJECTS: &str = "tracked_projects";
const NOTIFICATIONS: &str = "project_notifications";
const PREFERENCES: &str = "user_preferences";
const LAST_CHECKS: &str = "last_checks";
const NOTES: &str = "project_notes";

/// SurrealDB-backed document store.
///
/// Each record keeps the domain document under a `data` field and uses the
/// document's own id as the record id, so reads never have to translate
/// SurrealDB record ids back into strings.
#[derive(Clone)]
pub struct Database {
    client: Surreal<Client>,
}

impl Database {
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Initializing database connection to {}", config.database_url);

        let client = match config.database_url.strip_prefix("https://") {
            Some(address) => Surreal::new::<Https>(address.trim_end_matches('/')).await?,
            None => {
                let address = config
                    .database_url
                    .strip_prefix("http://")
                    .unwrap_or(&config.database_url)
                    .trim_end_matches('/');
                Surreal::new::<Http>(address).await?
            }
        };

        client
            .signin(Root {
                username: &config.database_username,
                password: &config.database_password,
            })
            .await?;
        client
            .use_ns(config.database_namespace.as_str())
            .use_db(config.database_name.as_str())
            .await?;

        Ok(Self { client })
    }

    pub async fn verify_connection(&self) -> Result<()> {
        match self.client.query("INFO FOR DB").await {
            Ok(_) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(AppError::from(e))
            }
        }
    }

    /// `SELECT VALUE data` with a `WHERE` clause over `data.*` fields.
    async fn select_where<T>(&self, table: &str, condition: &str, params: &[(&str, &str)]) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let sql = format!("SELECT VALUE data FROM type::table($tb) WHERE {}", condition);
        debug!("Executing query: {}", sql);

        let mut query = self.client.query(sql).bind(("tb", table.to_string()));
        for (name, value) in params {
            query = query.bind((name.to_string(), value.to_string()));
        }

        let mut response = query.await?;
        let rows: Vec<T> = response.take(0)?;
        Ok(rows)
    }

    async fn get_doc<T>(&self, table: &str, id: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let mut response = self
            .client
            .query("SELECT VALUE data FROM type::thing($tb, $id)")
            .bind(("tb", table.to_string()))
            .bind(("id", id.to_string()))
            .await?;
        let rows: Vec<T> = response.take(0)?;
        Ok(rows.into_iter().next())
    }

    /// Creates or replaces the document stored under `id`.
    async fn put_doc<T>(&self, table: &str, id: &str, doc: &T) -> Result<()>
    where
        T: Serialize,
    {
        let data = serde_json::to_value(doc)?;
        self.client
            .query("UPDATE type::thing($tb, $id) SET data = $data")
            .bind(("tb", table.to_string()))
            .bind(("id", id.to_string()))
            .bind(("data", data))
            .await?
            .check()?;
        Ok(())
    }

    /// Deletes `id`, reporting whether it existed.
    async fn delete_doc(&self, table: &str, id: &str) -> Result<bool> {
        let mut response = self
            .client
            .query("DELETE type::thing($tb, $id) RETURN BEFORE")
            .bind(("tb", table.to_string()))
            .bind(("id", id.to_string()))
            .await?;
        let removed: Vec<serde_json::Value> = response.take(0)?;
        Ok(!removed.is_empty())
    }
}

#[async_trait]
impl DataStore for Database {
    async fn list_tracked_projects(&self, user_id: &str) -> Result<Vec<TrackedProject>> {
        let mut tracked: Vec<TrackedProject> = self
            .select_where(TRACKED_PROJECTS, "data.user_id = $user_id", &[("user_id", user_id)])
            .await?;
        tracked.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tracked)
    }

    async fn find_tracked_project(&self, user_id: &str, project_id: &str) -> Result<Option<TrackedProject>> {
        // Older documents store the id under other field names; decoding
        // normalises them, so match after loading.
        Ok(self
            .list_tracked_projects(user_id)
            .await?
            .into_iter()
            .find(|tracked| tracked.project_id == project_id))
    }

    async fn insert_tracked_project(&self, tracked: &TrackedProject) -> Result<()> {
        self.put_doc(TRACKED_PROJECTS, &tracked.doc_id, tracked).await
    }

    async fn delete_tracked_project(&self, doc_id: &str) -> Result<()> {
        self.delete_doc(TRACKED_PROJECTS, doc_id).await.map(|_| ())
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        self.put_doc(NOTIFICATIONS, &notification.id, notification).await
    }

    async fn get_notification(&self, id: &str) -> Result<Option<Notification>> {
        self.get_doc(NOTIFICATIONS, id).await
    }

    async fn list_notifications(&self, user_id: &str, unread_only: bool) -> Result<Vec<Notification>> {
        let condition = if unread_only {
            "data.user_id = $user_id AND data.read = false"
        } else {
            "data.user_id = $user_id"
        };
        let mut notifications: Vec<Notification> = self
            .select_where(NOTIFICATIONS, condition, &[("user_id", user_id)])
            .await?;
        notifications.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(notifications)
    }

    async fn mark_notification_read(&self, id: &str, read_at: DateTime<Utc>) -> Result<bool> {
        let mut response = self
            .client
            .query("UPDATE type::thing($tb, $id) SET data.read = true, data.read_at = $read_at WHERE data != NONE RETURN AFTER")
            .bind(("tb", NOTIFICATIONS.to_string()))
            .bind(("id", id.to_string()))
            .bind(("read_at", read_at.to_rfc3339()))
            .await?;
        let updated: Vec<serde_json::Value> = response.take(0)?;
        Ok(!updated.is_empty())
    }

    async fn delete_notification(&self, id: &str) -> Result<bool> {
        self.delete_doc(NOTIFICATIONS, id).await
    }

    async fn get_preferences(&self, user_id: &str) -> Result<Option<UserPreferences>> {
        self.get_doc(PREFERENCES, user_id).await
    }

    async fn put_preferences(&self, preferences: &UserPreferences) -> Result<()> {
        self.put_doc(PREFERENCES, &preferences.user_id, preferences).await
    }

    async fn get_last_check(&self, user_id: &str) -> Result<Option<LastCheck>> {
        self.get_doc(LAST_CHECKS, user_id).await
    }

    async fn put_last_check(&self, last_check: &LastCheck) -> Result<()> {
        self.put_doc(LAST_CHECKS, &last_check.user_id, last_check).await
    }

    async fn list_notes(&self, user_id: &str, project_id: &str) -> Result<Vec<ProjectNote>> {
        let mut notes: Vec<ProjectNote> = self
            .select_where(
                NOTES,
                "data.user_id = $user_id AND data.project_id = $project_id",
                &[("user_id", user_id), ("project_id", project_id)],
            )
            .await?;
        notes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(notes)
    }

    async fn get_note(&self, id: &str) -> Result<Option<ProjectNote>> {
        self.get_doc(NOTES, id).await
    }

    async fn put_note(&self, note: &ProjectNote) -> Result<()> {
        self.put_doc(NOTES, &note.id, note).await
    }

    async fn delete_note(&self, id: &str) -> Result<bool> {
        self.delete_doc(NOTES, id).await
    }
}
