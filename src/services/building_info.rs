use crate::{
    config::Config,
    error::{AppError, Result},
    models::{
        period::UpdatePeriod,
        project::{parse_project_page, ProjectPage, ProjectRecord, UpdateType},
    },
    utils::retry::{fetch_with_retry, fetch_with_timeout, RetryPolicy},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

/// Rows requested per update-feed query.
pub const UPDATE_FEED_LIMIT: usize = 500;

/// `_apion` code selecting an explicit `min_apion`/`max_apion` window.
const DATE_RANGE_CODE: &str = "8";

/// Source of recently changed projects.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpdateFeed: Send + Sync {
    /// Whether both the API key and the user key are configured.
    fn has_credentials(&self) -> bool;

    /// `Major` queries `_updated=<period>`, `Minor` queries `_apion=<period>`.
    async fn fetch_updates(&self, update_type: UpdateType, period: UpdatePeriod) -> Result<Vec<ProjectRecord>>;

    /// Projects touched between `start` and `end`, inclusive.
    async fn fetch_updates_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<ProjectRecord>>;
}

/// Search parameters shared by the list and filter endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectSearch {
    pub page: usize,
    pub limit: usize,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub county: Option<String>,
    pub stage: Option<String>,
    pub keyword: Option<String>,
    pub min_value: Option<u64>,
    pub max_value: Option<u64>,
}

impl ProjectSearch {
    /// Upstream query parameters, including the `more=limit offset,count`
    /// pagination convention.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let page = self.page.max(1);
        let offset = (page - 1).saturating_mul(self.limit);
        let mut params = vec![("more", format!("limit {},{}", offset, self.limit))];

        let text_filters = [
            ("category", &self.category),
            ("subcategory", &self.subcategory),
            ("county", &self.county),
            ("stage", &self.stage),
            ("keyword", &self.keyword),
        ];
        for (name, value) in text_filters {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                params.push((name, value.to_string()));
            }
        }
        if let Some(min) = self.min_value {
            params.push(("min_value", min.to_string()));
        }
        if let Some(max) = self.max_value {
            params.push(("max_value", max.to_string()));
        }
        params
    }

    /// Stable key for response caching.
    pub fn cache_key(&self) -> String {
        self.to_params()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// HTTP client for the BuildingInfo planning API.
#[derive(Clone)]
pub struct BuildingInfoClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
    user_key: Option<String>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl BuildingInfoClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("planning-tracker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = Url::parse(&config.building_info_api_url).map_err(|e| {
            AppError::Internal(format!(
                "Invalid BUILDING_INFO_API_URL '{}': {}",
                config.building_info_api_url, e
            ))
        })?;

        Ok(Self {
            http,
            base_url,
            api_key: config.building_info_api_key.clone(),
            user_key: config.building_info_user_key.clone(),
            retry: RetryPolicy::from_config(config),
            timeout: config.request_timeout(),
        })
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        match (self.api_key.as_deref(), self.user_key.as_deref()) {
            (Some(key), Some(ukey)) if !key.is_empty() && !ukey.is_empty() => Ok((key, ukey)),
            _ => Err(AppError::MissingCredentials),
        }
    }

    fn build_url(&self, params: &[(&str, String)]) -> Result<Url> {
        let (api_key, user_key) = self.credentials()?;
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("api_key", api_key);
            query.append_pair("ukey", user_key);
            for (name, value) in params {
                query.append_pair(name, value);
            }
        }
        Ok(url)
    }

    /// GET with retry on transient failures and a per-attempt timeout.
    pub async fn get_page(&self, params: &[(&str, String)]) -> Result<ProjectPage> {
        let url = self.build_url(params)?;
        debug!(
            "BuildingInfo request: {}",
            params.iter().map(|(k, v)| format!("{}={}", k, v)).collect::<Vec<_>>().join("&")
        );

        fetch_with_retry(&self.retry, |attempt| {
            let url = url.clone();
            async move {
                if attempt > 1 {
                    debug!("BuildingInfo attempt {}", attempt);
                }
                fetch_with_timeout(self.timeout, self.send(url)).await
            }
        })
        .await
    }

    async fn send(&self, url: Url) -> Result<ProjectPage> {
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("BuildingInfo returned error status: {}", status);
            return Err(AppError::UpstreamStatus {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            error!("Failed to decode BuildingInfo response: {}", e);
            AppError::UnexpectedResponse(format!("body is not JSON: {}", e))
        })?;

        parse_project_page(body)
    }

    pub async fn search_projects(&self, search: &ProjectSearch) -> Result<ProjectPage> {
        self.get_page(&search.to_params()).await
    }

    pub async fn get_project(&self, planning_id: &str) -> Result<Option<ProjectRecord>> {
        let page = self
            .get_page(&[("planning_id", planning_id.to_string())])
            .await?;
        Ok(page.rows.into_iter().find(|row| row.planning_id == planning_id))
    }
}

#[async_trait]
impl UpdateFeed for BuildingInfoClient {
    fn has_credentials(&self) -> bool {
        self.credentials().is_ok()
    }

    async fn fetch_updates(&self, update_type: UpdateType, period: UpdatePeriod) -> Result<Vec<ProjectRecord>> {
        let filter = match update_type {
            UpdateType::Major => "_updated",
            UpdateType::Minor => "_apion",
        };
        let params = [
            (filter, period.as_code().to_string()),
            ("more", format!("limit 0,{}", UPDATE_FEED_LIMIT)),
        ];
        Ok(self.get_page(&params).await?.rows)
    }

    async fn fetch_updates_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<ProjectRecord>> {
        let params = [
            ("_apion", DATE_RANGE_CODE.to_string()),
            ("min_apion", start.format("%Y-%m-%d").to_string()),
            ("max_apion", end.format("%Y-%m-%d").to_string()),
            ("more", format!("limit 0,{}", UPDATE_FEED_LIMIT)),
        ];
        Ok(self.get_page(&params).await?.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_params() {
        let search = ProjectSearch {
            page: 3,
            limit: 20,
            category: Some("Residential".into()),
            county: Some("  ".into()),
            min_value: Some(1_000_000),
            ..Default::default()
        };
        let params = search.to_params();
        assert_eq!(params[0], ("more", "limit 40,20".to_string()));
        assert!(params.contains(&("category", "Residential".to_string())));
        assert!(params.contains(&("min_value", "1000000".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "county"));
    }

    #[test]
    fn test_search_params_huge_page_saturates() {
        let search = ProjectSearch { page: usize::MAX, limit: 20, ..Default::default() };
        let params = search.to_params();
        assert_eq!(params[0], ("more", format!("limit {},20", usize::MAX)));
    }

    #[test]
    fn test_missing_credentials() {
        let client = BuildingInfoClient::new(&Config::default()).unwrap();
        assert!(!client.has_credentials());
        assert!(matches!(client.build_url(&[]), Err(AppError::MissingCredentials)));
    }

    #[test]
    fn test_url_carries_keys() {
        let config = Config {
            building_info_api_key: Some("key-1".into()),
            building_info_user_key: Some("ukey-1".into()),
            ..Config::default()
        };
        let client = BuildingInfoClient::new(&config).unwrap();
        let url = client.build_url(&[("_updated", "3".to_string())]).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("api_key".into(), "key-1".into())));
        assert!(pairs.contains(&("ukey".into(), "ukey-1".into())));
        assert!(pairs.contains(&("_updated".into(), "3".into())));
    }
}
