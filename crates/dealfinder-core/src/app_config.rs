use std::net::SocketAddr;
use std::path::PathBuf;

use rust_decimal::Decimal;

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
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// `None` when `SERPAPI_KEY` is unset; searches then fail with a config error.
    pub serpapi_api_key: Option<String>,
    pub serpapi_base_url: String,
    /// Optional YAML override for the built-in retailer catalog.
    pub retailers_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub results_per_retailer: u32,
    pub enrichment_results: u32,
    pub enrichment_enabled: bool,
    pub fuzzy_title_match: bool,
    /// Upper bound of the accepted price range; the lower bound is always `> 0`.
    pub price_max: Decimal,
    pub free_daily_searches: u32,
    pub premium_daily_searches: u32,
    pub rate_limit_per_minute: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "serpapi_api_key",
                &self.serpapi_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("serpapi_base_url", &self.serpapi_base_url)
            .field("retailers_path", &self.retailers_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("results_per_retailer", &self.results_per_retailer)
            .field("enrichment_results", &self.enrichment_results)
            .field("enrichment_enabled", &self.enrichment_enabled)
            .field("fuzzy_title_match", &self.fuzzy_title_match)
            .field("price_max", &self.price_max)
            .field("free_daily_searches", &self.free_daily_searches)
            .field("premium_daily_searches", &self.premium_daily_searches)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish()
    }
}
