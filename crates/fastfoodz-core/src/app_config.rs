use std::time::Duration;

use crate::place::Category;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub yelp_api_key: String,
    pub yelp_base_url: String,
    pub search_limit: u32,
    pub search_radius_meters: u32,
    pub search_categories: Vec<Category>,
    pub request_timeout_secs: u64,
    pub cache_ttl_secs: Option<u64>,
    pub user_agent: String,
}

impl AppConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("yelp_api_key", &"[redacted]")
            .field("yelp_base_url", &self.yelp_base_url)
            .field("search_limit", &self.search_limit)
            .field("search_radius_meters", &self.search_radius_meters)
            .field("search_categories", &self.search_categories)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
