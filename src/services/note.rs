use crate::{
    error::{AppError, Result},
    models::note::{CreateNoteRequest, ProjectNote, UpdateNoteRequest},
    services::store::DataStore,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn DataStore>,
}

impl NoteService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn list_notes(&self, user_id: &str, project_id: &str) -> Result<Vec<ProjectNote>> {
        self.store.list_notes(user_id, project_id).await
    }

    pub async fn create_note(
        &self,
        user_id: &str,
        project_id: &str,
        request: CreateNoteRequest,
    ) -> Result<ProjectNote> {
        request.validate()?;
        debug!("Creating note on project {} for user {}", project_id, user_id);

        let now = Utc::now();
        let note = ProjectNote {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            project_id: project_id.to_string(),
            content: request.content.trim().to_string(),
            created_at: now,
            updated_at: now,
        };

        self.store.put_note(&note).await?;
        info!("Created note {}", note.id);
        Ok(note)
    }

    pub async fn update_note(&self, note_id: &str, request: UpdateNoteRequest) -> Result<ProjectNote> {
        request.validate()?;

        let mut note = self
            .store
            .get_note(note_id)
            .await?
            .ok_or_else(|| AppError::not_found("Note"))?;

        note.content = request.content.trim().to_string();
        note.updated_at = Utc::now();

        self.store.put_note(&note).await?;
        Ok(note)
    }

    pub async fn delete_note(&self, note_id: &str) -> Result<()> {
        if !self.store.delete_note(note_id).await? {
            return Err(AppError::not_found("Note"));
        }
        info!("Deleted note {}", note_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::MemoryStore;

    #[tokio::test]
    async fn test_note_lifecycle() {
        let service = NoteService::new(Arc::new(MemoryStore::new()));

        let note = service
            .create_note("u1", "42", CreateNoteRequest { content: " Called the council ".into() })
            .await
            .unwrap();
        assert_eq!(note.content, "Called the council");

        let updated = service
            .update_note(&note.id, UpdateNoteRequest { content: "Site visit booked".into() })
            .await
            .unwrap();
        assert_eq!(updated.content, "Site visit booked");
        assert!(updated.updated_at >= note.created_at);

        let notes = service.list_notes("u1", "42").await.unwrap();
        assert_eq!(notes.len(), 1);
        assert!(service.list_notes("u1", "43").await.unwrap().is_empty());

        service.delete_note(&note.id).await.unwrap();
        assert!(matches!(service.delete_note(&note.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_content_is_rejected() {
        let service = NoteService::new(Arc::new(MemoryStore::new()));
        let err = service
            .create_note("u1", "42", CreateNoteRequest { content: String::new() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidatorError(_)));
    }
}
