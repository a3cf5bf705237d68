use crate::{
    config::Config,
    error::{AppError, Result},
    models::{
        period::UpdatePeriod,
        project::{
            summarize_categories, CategorySummary, ProjectFilterQuery, ProjectListQuery, ProjectPage,
            ProjectRecord, ProjectView, TaggedProject, UpdateType,
        },
        response::Paginated,
    },
    services::{
        building_info::{BuildingInfoClient, ProjectSearch, UpdateFeed},
        update_checker::merge_updates,
    },
    utils::{
        cache::{cache_key, Cache},
        currency::convert_to_euros_with_rate,
        validation::{normalize_pagination, validate_planning_id},
    },
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use validator::Validate;

/// Rows sampled from the feed when building the category summary.
const CATEGORY_SAMPLE_SIZE: usize = 500;

/// Read-side proxy over BuildingInfo with response caching.
#[derive(Clone)]
pub struct ProjectService {
    client: Arc<BuildingInfoClient>,
    pages: Cache<ProjectPage>,
    details: Cache<ProjectRecord>,
    categories: Cache<Vec<CategorySummary>>,
    gbp_to_eur_rate: f64,
    default_page_size: usize,
    max_page_size: usize,
}

impl ProjectService {
    pub fn new(client: Arc<BuildingInfoClient>, config: &Config) -> Self {
        let ttl = Duration::from_secs(config.cache_ttl);
        Self {
            client,
            pages: Cache::new(ttl),
            details: Cache::new(ttl),
            categories: Cache::new(Duration::from_secs(config.categories_cache_ttl)),
            gbp_to_eur_rate: config.gbp_to_eur_rate,
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }

    pub async fn list_projects(&self, query: ProjectListQuery) -> Result<Paginated<ProjectView>> {
        let (page, limit) = normalize_pagination(query.page, query.limit, self.default_page_size, self.max_page_size);
        let search = ProjectSearch {
            page,
            limit,
            category: query.category,
            county: query.county,
            keyword: query.search,
            ..Default::default()
        };
        self.search(search).await
    }

    pub async fn filter_projects(&self, query: ProjectFilterQuery) -> Result<Paginated<ProjectView>> {
        query.validate()?;
        if let (Some(min), Some(max)) = (query.min_value, query.max_value) {
            if min > max {
                return Err(AppError::validation("min_value must not exceed max_value"));
            }
        }

        let (page, limit) = normalize_pagination(query.page, query.limit, self.default_page_size, self.max_page_size);
        let search = ProjectSearch {
            page,
            limit,
            category: query.category,
            subcategory: query.subcategory,
            county: query.county,
            stage: query.stage,
            min_value: query.min_value,
            max_value: query.max_value,
            ..Default::default()
        };
        self.search(search).await
    }

    async fn search(&self, search: ProjectSearch) -> Result<Paginated<ProjectView>> {
        let key = cache_key("projects", &[("q", Some(&search.cache_key()))]);
        let (page_number, limit) = (search.page, search.limit);
        let client = self.client.clone();
        let page = self
            .pages
            .get_or_fetch(&key, || async move { client.search_projects(&search).await })
            .await?;

        debug!("Project search returned {} rows", page.rows.len());
        Ok(Paginated {
            items: page.rows.into_iter().map(|r| self.to_view(r)).collect(),
            page: page_number,
            limit,
            total: page.total,
        })
    }

    pub async fn get_project(&self, planning_id: &str) -> Result<ProjectView> {
        validate_planning_id(planning_id)?;

        let key = cache_key("project", &[("id", Some(planning_id))]);
        if let Some(record) = self.details.get(&key) {
            return Ok(self.to_view(record));
        }

        // Misses are not cached.
        let record = self
            .client
            .get_project(planning_id)
            .await?
            .ok_or_else(|| AppError::not_found("Project"))?;
        self.details.set(key, record.clone());

        Ok(self.to_view(record))
    }

    pub async fn categories(&self) -> Result<Vec<CategorySummary>> {
        let client = self.client.clone();
        self.categories
            .get_or_fetch("categories", || async move {
                let sample = ProjectSearch {
                    page: 1,
                    limit: CATEGORY_SAMPLE_SIZE,
                    ..Default::default()
                };
                let page = client.search_projects(&sample).await?;
                Ok::<_, AppError>(summarize_categories(&page.rows))
            })
            .await
    }

    /// Raw merged update feed for `period_code`, which must be one of the
    /// canonical period codes. Absent means today.
    pub async fn project_updates(&self, period_code: Option<&str>) -> Result<Vec<TaggedProject>> {
        let period = match period_code {
            None => UpdatePeriod::default(),
            Some(code) => UpdatePeriod::from_code(code).ok_or_else(|| {
                AppError::validation(&format!(
                    "Invalid period '{}'. Expected one of: 3, -1.1, -7.1, -30.1",
                    code
                ))
            })?,
        };

        let (major, minor) = tokio::try_join!(
            self.client.fetch_updates(UpdateType::Major, period),
            self.client.fetch_updates(UpdateType::Minor, period),
        )?;

        let merged = merge_updates(major, minor);
        info!("Update feed for {} returned {} projects", period.label(), merged.len());
        Ok(merged)
    }

    /// Drops expired cache entries, returning how many were removed.
    pub fn purge_expired_cache(&self) -> usize {
        self.pages.purge_expired() + self.details.purge_expired() + self.categories.purge_expired()
    }

    fn to_view(&self, record: ProjectRecord) -> ProjectView {
        let planning_value_eur = record
            .planning_value
            .as_deref()
            .map(|v| convert_to_euros_with_rate(v, self.gbp_to_eur_rate));
        ProjectView {
            record,
            planning_value_eur,
        }
    }
}
