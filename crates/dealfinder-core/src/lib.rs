//! Shared domain types and configuration for dealfinder.
//!
//! Holds the retailer catalog, the canonical [`Offer`] model, environment
//! configuration, and the per-session search quota service.

pub mod app_config;
pub mod config;
pub mod offers;
pub mod quota;
pub mod retailers;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use offers::{format_usd, Offer, PriceValue, CHECK_WEBSITE};
pub use quota::{
    Clock, InMemorySessionStore, QuotaLimits, QuotaService, QuotaStatus, Remaining,
    SessionRecord, SessionStore, Subscription, SystemClock,
};
pub use retailers::{load_catalog, load_retailers, Retailer, RetailerCatalog, RetailersFile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read retailers file {path}: {source}")]
    RetailersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse retailers file: {0}")]
    RetailersFileParse(#[from] serde_yaml::Error),

    #[error("retailer catalog validation failed: {0}")]
    Validation(String),
}
