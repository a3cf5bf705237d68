use crate::utils::serde_helpers::scalar_to_string;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// A user's subscription to a planning project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTrackedProject")]
pub struct TrackedProject {
    pub doc_id: String,
    pub user_id: String,
    pub project_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Stored shape, tolerating the older field names the project id was
/// written under (`projectId`, then `planning_id`, then `id`).
#[derive(Deserialize)]
struct RawTrackedProject {
    doc_id: String,
    user_id: String,
    #[serde(default)]
    project_id: Option<Value>,
    #[serde(default, rename = "projectId")]
    project_id_camel: Option<Value>,
    #[serde(default)]
    planning_id: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
}

impl TryFrom<RawTrackedProject> for TrackedProject {
    type Error = String;

    fn try_from(raw: RawTrackedProject) -> Result<Self, Self::Error> {
        let project_id = [&raw.project_id, &raw.project_id_camel, &raw.planning_id, &raw.id]
            .into_iter()
            .flatten()
            .find_map(scalar_to_string)
            .ok_or_else(|| format!("tracked project {} has no project id", raw.doc_id))?;

        Ok(TrackedProject {
            doc_id: raw.doc_id,
            user_id: raw.user_id,
            project_id,
            title: raw.title.unwrap_or_default(),
            created_at: raw.created_at,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TrackProjectRequest {
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
    #[validate(length(min = 1, max = 64))]
    pub planning_id: String,
    #[validate(length(max = 500))]
    pub title: Option<String>,
}
