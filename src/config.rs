use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Which document store backs tracked projects, notes and notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseMode {
    Surreal,
    Memory,
}

impl std::str::FromStr for DatabaseMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "surreal" | "surrealdb" => Ok(Self::Surreal),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(anyhow::anyhow!("unknown DATABASE_MODE: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,
    pub log_format: String,

    // Database configuration
    pub database_mode: DatabaseMode,
    pub database_url: String,
    pub database_namespace: String,
    pub database_name: String,
    pub database_username: String,
    pub database_password: String,

    // BuildingInfo API
    pub building_info_api_url: String,
    pub building_info_api_key: Option<String>,
    pub building_info_user_key: Option<String>,
    pub request_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_initial_delay_ms: u64,
    pub retry_multiplier: u32,

    // Currency
    pub gbp_to_eur_rate: f64,

    // Caching
    pub cache_ttl: u64,
    pub categories_cache_ttl: u64,

    // Pagination
    pub default_page_size: usize,
    pub max_page_size: usize,

    // CORS configuration
    pub cors_allowed_origins: String,

    // Rate limiting
    pub rate_limit_requests: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("PORT")
                .or_else(|_| env::var("SERVER_PORT"))
                .unwrap_or_else(|_| "5000".to_string())
                .parse()?,
            environment: env::var("NODE_ENV")
                .or_else(|_| env::var("ENVIRONMENT"))
                .unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),

            database_mode: env::var("DATABASE_MODE")
                .unwrap_or_else(|_| "surreal".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            database_namespace: env::var("DATABASE_NAMESPACE")
                .unwrap_or_else(|_| "planning".to_string()),
            database_name: env::var("DATABASE_NAME")
                .unwrap_or_else(|_| "tracker".to_string()),
            database_username: env::var("DATABASE_USERNAME")
                .unwrap_or_else(|_| "root".to_string()),
            database_password: env::var("DATABASE_PASSWORD")
                .unwrap_or_else(|_| "root".to_string()),

            building_info_api_url: env::var("BUILDING_INFO_API_URL").unwrap_or_else(|_| {
                "https://api12.buildinginfo.com/api/v2/bi/projects/t-projects".to_string()
            }),
            building_info_api_key: non_empty_var(&[
                "BUILDING_INFO_API_KEY",
                "REACT_APP_BUILDINGINFO_API_KEY",
            ]),
            building_info_user_key: non_empty_var(&[
                "BUILDING_INFO_USER_KEY",
                "REACT_APP_BUILDINGINFO_UKEY",
            ]),
            request_timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()?,
            max_retries: env::var("MAX_RETRIES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()?,
            retry_initial_delay_ms: env::var("RETRY_INITIAL_DELAY_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()?,
            retry_multiplier: env::var("RETRY_MULTIPLIER")
                .unwrap_or_else(|_| "2".to_string())
                .parse()?,

            gbp_to_eur_rate: env::var("GBP_TO_EUR_RATE")
                .unwrap_or_else(|_| "1.17".to_string())
                .parse()?,

            cache_ttl: env::var("CACHE_TTL")
                .unwrap_or_else(|_| "300".to_string())
                .parse()?,
            categories_cache_ttl: env::var("CATEGORIES_CACHE_TTL")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()?,

            default_page_size: env::var("DEFAULT_PAGE_SIZE")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,
            max_page_size: env::var("MAX_PAGE_SIZE")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),

            rate_limit_requests: env::var("RATE_LIMIT_REQUESTS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()?,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn has_api_credentials(&self) -> bool {
        self.building_info_api_key.is_some() && self.building_info_user_key.is_some()
    }
}

impl Default for Config {
    /// Local defaults: in-memory store, no API credentials.
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 5000,
            environment: "development".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            database_mode: DatabaseMode::Memory,
            database_url: "http://localhost:8000".to_string(),
            database_namespace: "planning".to_string(),
            database_name: "tracker".to_string(),
            database_username: "root".to_string(),
            database_password: "root".to_string(),
            building_info_api_url: "https://api12.buildinginfo.com/api/v2/bi/projects/t-projects"
                .to_string(),
            building_info_api_key: None,
            building_info_user_key: None,
            request_timeout_ms: 10_000,
            max_retries: 3,
            retry_initial_delay_ms: 1000,
            retry_multiplier: 2,
            gbp_to_eur_rate: 1.17,
            cache_ttl: 300,
            categories_cache_ttl: 3600,
            default_page_size: 20,
            max_page_size: 100,
            cors_allowed_origins: "http://localhost:3000".to_string(),
            rate_limit_requests: 120,
        }
    }
}

/// First set, non-blank variable among `names`.
fn non_empty_var(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}
