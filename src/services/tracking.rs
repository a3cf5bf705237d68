use crate::{
    error::{AppError, Result},
    models::tracking::{TrackProjectRequest, TrackedProject},
    services::store::DataStore,
    utils::validation::{validate_planning_id, validate_user_id},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct TrackingService {
    store: Arc<dyn DataStore>,
}

impl TrackingService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn track_project(&self, request: TrackProjectRequest) -> Result<TrackedProject> {
        request.validate()?;
        validate_user_id(&request.user_id)?;
        validate_planning_id(&request.planning_id)?;

        debug!("Tracking project {} for user {}", request.planning_id, request.user_id);

        if self
            .store
            .find_tracked_project(&request.user_id, &request.planning_id)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("Project is already tracked"));
        }

        let title = request
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("Project {}", request.planning_id));

        let tracked = TrackedProject {
            doc_id: Uuid::new_v4().to_string(),
            user_id: request.user_id,
            project_id: request.planning_id,
            title,
            created_at: Utc::now(),
        };

        self.store.insert_tracked_project(&tracked).await?;
        info!("User {} is now tracking project {}", tracked.user_id, tracked.project_id);
        Ok(tracked)
    }

    pub async fn untrack_project(&self, user_id: &str, planning_id: &str) -> Result<()> {
        let tracked = self
            .store
            .find_tracked_project(user_id, planning_id)
            .await?
            .ok_or_else(|| AppError::not_found("Tracked project"))?;

        self.store.delete_tracked_project(&tracked.doc_id).await?;
        info!("User {} stopped tracking project {}", user_id, planning_id);
        Ok(())
    }

    pub async fn list_tracked_projects(&self, user_id: &str) -> Result<Vec<TrackedProject>> {
        validate_user_id(user_id)?;
        self.store.list_tracked_projects(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::MemoryStore;

    fn request(planning_id: &str, title: Option<&str>) -> TrackProjectRequest {
        request_for("u1", planning_id, title)
    }

    fn request_for(user_id: &str, planning_id: &str, title: Option<&str>) -> TrackProjectRequest {
        TrackProjectRequest {
            user_id: user_id.into(),
            planning_id: planning_id.into(),
            title: title.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_track_then_conflict() {
        let service = TrackingService::new(Arc::new(MemoryStore::new()));

        let tracked = service.track_project(request("501", Some("Harbour bridge"))).await.unwrap();
        assert_eq!(tracked.project_id, "501");
        assert_eq!(tracked.title, "Harbour bridge");

        let err = service.track_project(request("501", None)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_default_title_and_listing() {
        let service = TrackingService::new(Arc::new(MemoryStore::new()));
        service.track_project(request("7", Some("  "))).await.unwrap();
        service.track_project(request("8", None)).await.unwrap();

        let listed = service.list_tracked_projects("u1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().any(|t| t.project_id == "7" && t.title == "Project 7"));
    }

    #[tokio::test]
    async fn test_underscored_ids_do_not_collide() {
        let service = TrackingService::new(Arc::new(MemoryStore::new()));
        service.track_project(request_for("a_b", "c", None)).await.unwrap();
        service.track_project(request_for("a", "b_c", None)).await.unwrap();

        let first = service.list_tracked_projects("a_b").await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].project_id, "c");

        let second = service.list_tracked_projects("a").await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].project_id, "b_c");
        assert_ne!(first[0].doc_id, second[0].doc_id);
    }

    #[tokio::test]
    async fn test_untrack() {
        let service = TrackingService::new(Arc::new(MemoryStore::new()));
        service.track_project(request("9", None)).await.unwrap();

        service.untrack_project("u1", "9").await.unwrap();
        assert!(service.list_tracked_projects("u1").await.unwrap().is_empty());
        assert!(matches!(
            service.untrack_project("u1", "9").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_bad_ids() {
        let service = TrackingService::new(Arc::new(MemoryStore::new()));
        assert!(service.track_project(request("12;DROP", None)).await.is_err());
        assert!(service.track_project(request("", None)).await.is_err());
    }
}
