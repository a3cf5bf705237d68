use crate::error::{AppError, Result};
use crate::utils::serde_helpers::{opt_string_or_number, scalar_to_string, string_or_number};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use validator::Validate;

/// One project row as returned by BuildingInfo.
///
/// Only the fields this service reasons about are typed; everything else is
/// kept in `extra` and passed through to clients untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    #[serde(deserialize_with = "string_or_number::deserialize")]
    pub planning_id: String,
    #[serde(default, deserialize_with = "opt_string_or_number::deserialize")]
    pub planning_title: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number::deserialize")]
    pub planning_stage: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number::deserialize")]
    pub planning_value: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number::deserialize")]
    pub planning_county: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number::deserialize")]
    pub planning_region: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number::deserialize")]
    pub planning_category: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number::deserialize")]
    pub planning_subcategory: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number::deserialize")]
    pub planning_type: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number::deserialize")]
    pub planning_description: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number::deserialize")]
    pub planning_updated: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectRecord {
    pub fn title(&self) -> &str {
        self.planning_title.as_deref().unwrap_or("Untitled project")
    }

    /// True when an untyped field is present with a non-blank scalar value.
    pub fn has_flag(&self, field: &str) -> bool {
        match self.extra.get(field) {
            Some(Value::Bool(b)) => *b,
            Some(v) => scalar_to_string(v).map_or(false, |s| s != "0" && s != "false"),
            None => false,
        }
    }
}

/// Which feed query surfaced a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateType {
    /// Returned by the `_updated` filter (stage/value changes).
    Major,
    /// Returned by the `_apion` filter (general recency).
    Minor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedProject {
    #[serde(flatten)]
    pub record: ProjectRecord,
    #[serde(rename = "updateType")]
    pub update_type: UpdateType,
}

/// A page of projects decoded from the upstream envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectPage {
    pub rows: Vec<ProjectRecord>,
    pub total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<EnvelopeData>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    rows: Vec<ProjectRecord>,
    #[serde(default, alias = "total_rows", alias = "totalRows", alias = "count")]
    total: Option<Value>,
}

/// Decodes the BuildingInfo response body `{ "data": { "rows": [...] } }`.
///
/// Any other shape is rejected with `AppError::UnexpectedResponse`; an
/// envelope carrying an error marker is surfaced as an upstream failure.
pub fn parse_project_page(body: Value) -> Result<ProjectPage> {
    let envelope: Envelope = serde_json::from_value(body)
        .map_err(|e| AppError::UnexpectedResponse(e.to_string()))?;

    let status_is_error = envelope
        .status
        .as_ref()
        .and_then(scalar_to_string)
        .map_or(false, |s| s.eq_ignore_ascii_case("error"));
    let error_text = envelope.error.as_ref().and_then(scalar_to_string);

    if status_is_error || error_text.is_some() {
        let message = error_text
            .or(envelope.message)
            .unwrap_or_else(|| "upstream reported an error".to_string());
        return Err(AppError::UpstreamStatus { status: 200, message });
    }

    let data = envelope
        .data
        .ok_or_else(|| AppError::UnexpectedResponse("missing `data.rows`".to_string()))?;

    Ok(ProjectPage {
        total: data
            .total
            .as_ref()
            .and_then(scalar_to_string)
            .and_then(|t| t.parse().ok()),
        rows: data.rows,
    })
}

/// Project as returned to clients, with the euro-normalised value.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    #[serde(flatten)]
    pub record: ProjectRecord,
    pub planning_value_eur: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SubcategorySummary {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategorySummary {
    pub name: String,
    pub count: usize,
    pub subcategories: Vec<SubcategorySummary>,
}

/// Groups projects by category and subcategory, alphabetically.
pub fn summarize_categories(rows: &[ProjectRecord]) -> Vec<CategorySummary> {
    let mut grouped: BTreeMap<&str, (usize, BTreeMap<&str, usize>)> = BTreeMap::new();

    for row in rows {
        let Some(category) = row.planning_category.as_deref() else {
            continue;
        };
        let entry = grouped.entry(category).or_default();
        entry.0 += 1;
        if let Some(sub) = row.planning_subcategory.as_deref() {
            *entry.1.entry(sub).or_default() += 1;
        }
    }

    grouped
        .into_iter()
        .map(|(name, (count, subs))| CategorySummary {
            name: name.to_string(),
            count,
            subcategories: subs
                .into_iter()
                .map(|(name, count)| SubcategorySummary { name: name.to_string(), count })
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectListQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub category: Option<String>,
    pub county: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProjectFilterQuery {
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[validate(length(max = 100))]
    pub subcategory: Option<String>,
    #[validate(length(max = 100))]
    pub county: Option<String>,
    #[validate(length(max = 100))]
    pub stage: Option<String>,
    pub min_value: Option<u64>,
    pub max_value: Option<u64>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectUpdatesQuery {
    pub period: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_rows_envelope() {
        let page = parse_project_page(json!({
            "status": "OK",
            "data": {
                "rows": [
                    { "planning_id": 101, "planning_title": "New school", "planning_stage": "Plans Granted", "_updated": "1" },
                    { "planning_id": "102", "planning_value": "£2,500,000" }
                ],
                "total_rows": "57"
            }
        }))
        .unwrap();

        assert_eq!(page.total, Some(57));
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.rows[0].planning_id, "101");
        assert_eq!(page.rows[0].title(), "New school");
        assert!(page.rows[0].has_flag("_updated"));
        assert_eq!(page.rows[1].title(), "Untitled project");
        assert_eq!(page.rows[1].planning_value.as_deref(), Some("£2,500,000"));
    }

    #[test]
    fn test_bare_array_is_rejected() {
        let err = parse_project_page(json!([{ "planning_id": 1 }])).unwrap_err();
        assert!(matches!(err, AppError::UnexpectedResponse(_)));

        let err = parse_project_page(json!({ "rows": [] })).unwrap_err();
        assert!(matches!(err, AppError::UnexpectedResponse(_)));
    }

    #[test]
    fn test_error_envelope_is_upstream_failure() {
        let err = parse_project_page(json!({ "status": "error", "message": "Invalid ukey" })).unwrap_err();
        match err {
            AppError::UpstreamStatus { message, .. } => assert_eq!(message, "Invalid ukey"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_summarize_categories() {
        let page = parse_project_page(json!({
            "data": { "rows": [
                { "planning_id": 1, "planning_category": "Residential", "planning_subcategory": "Houses" },
                { "planning_id": 2, "planning_category": "Residential", "planning_subcategory": "Apartments" },
                { "planning_id": 3, "planning_category": "Residential", "planning_subcategory": "Houses" },
                { "planning_id": 4, "planning_category": "Commercial" },
                { "planning_id": 5 }
            ] }
        }))
        .unwrap();

        let summary = summarize_categories(&page.rows);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].name, "Commercial");
        assert_eq!(summary[0].count, 1);
        assert!(summary[0].subcategories.is_empty());
        assert_eq!(summary[1].name, "Residential");
        assert_eq!(summary[1].count, 3);
        assert_eq!(
            summary[1].subcategories,
            vec![
                SubcategorySummary { name: "Apartments".into(), count: 1 },
                SubcategorySummary { name: "Houses".into(), count: 2 },
            ]
        );
    }
}
