use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Path substrings that mark search, browse, or category pages on any retailer.
const DEFAULT_NAVIGATIONAL_PATTERNS: &[&str] = &[
    "/search",
    "/searchpage",
    "/browse",
    "/category",
    "/c/",
    "?st=",
    "&st=",
    "/s?",
    "/sch/",
    "/s/",
    "/b/",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retailer {
    pub name: String,
    pub domain: String,
    pub product_patterns: Vec<String>,
}

impl Retailer {
    #[must_use]
    pub fn new(name: &str, domain: &str, product_patterns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            domain: domain.to_string(),
            product_patterns: product_patterns.iter().map(|p| (*p).to_string()).collect(),
        }
    }

    /// Returns `true` when the URL's host is this retailer's domain or one of
    /// its subdomains.
    #[must_use]
    pub fn owns_url(&self, url: &str) -> bool {
        let Some(host) = url_host(url) else {
            return false;
        };
        let domain = self.domain.to_ascii_lowercase();
        host == domain || host.ends_with(&format!(".{domain}"))
    }
}

/// Extract the lower-cased host portion of an absolute URL.
///
/// Returns `None` for relative or otherwise host-less input.
#[must_use]
pub fn url_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    parsed.host_str().map(str::to_ascii_lowercase)
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetailersFile {
    pub retailers: Vec<Retailer>,
    #[serde(default)]
    pub navigational_patterns: Vec<String>,
}

/// Validated, immutable set of retailers plus the shared navigational patterns.
#[derive(Debug, Clone)]
pub struct RetailerCatalog {
    retailers: Vec<Retailer>,
    navigational_patterns: Vec<String>,
}

impl RetailerCatalog {
    /// Build a catalog from already-parsed retailers.
    ///
    /// An empty `navigational_patterns` list falls back to the built-in set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the retailer set is invalid.
    pub fn new(
        retailers: Vec<Retailer>,
        navigational_patterns: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let navigational_patterns = if navigational_patterns.is_empty() {
            default_navigational_patterns()
        } else {
            navigational_patterns
                .into_iter()
                .map(|p| p.to_ascii_lowercase())
                .collect()
        };
        let catalog = Self {
            retailers,
            navigational_patterns,
        };
        validate_catalog(&catalog)?;
        Ok(catalog)
    }

    /// The six retailers the service ships with.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            retailers: vec![
                Retailer::new(
                    "Amazon",
                    "amazon.com",
                    &["/dp/", "/gp/product/", "/product/", "/d/", "/b/"],
                ),
                Retailer::new("Walmart", "walmart.com", &["/ip/", "/product/"]),
                Retailer::new("Best Buy", "bestbuy.com", &["/site/", "/product/"]),
                Retailer::new("Target", "target.com", &["/p/", "/product/"]),
                Retailer::new("eBay", "ebay.com", &["/itm/", "/p/", "/i/"]),
                Retailer::new("Newegg", "newegg.com", &["/product/", "/p/"]),
            ],
            navigational_patterns: default_navigational_patterns(),
        }
    }

    #[must_use]
    pub fn retailers(&self) -> &[Retailer] {
        &self.retailers
    }

    #[must_use]
    pub fn navigational_patterns(&self) -> &[String] {
        &self.navigational_patterns
    }

    /// Find the retailer whose domain owns `url`.
    ///
    /// Validation guarantees domains never overlap, so at most one retailer matches.
    #[must_use]
    pub fn match_url(&self, url: &str) -> Option<&Retailer> {
        self.retailers.iter().find(|r| r.owns_url(url))
    }

    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Retailer> {
        self.retailers
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
    }
}

fn default_navigational_patterns() -> Vec<String> {
    DEFAULT_NAVIGATIONAL_PATTERNS
        .iter()
        .map(|p| (*p).to_string())
        .collect()
}

/// Load and validate a retailer catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_retailers(path: &Path) -> Result<RetailerCatalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RetailersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: RetailersFile =
        serde_yaml::from_str(&content).map_err(ConfigError::RetailersFileParse)?;

    RetailerCatalog::new(file.retailers, file.navigational_patterns)
}

/// Resolve the catalog for a running process: the YAML override when
/// configured, the built-in set otherwise.
///
/// # Errors
///
/// Propagates [`load_retailers`] failures for a configured override path.
pub fn load_catalog(config: &AppConfig) -> Result<RetailerCatalog, ConfigError> {
    match &config.retailers_path {
        Some(path) => {
            let catalog = load_retailers(path)?;
            tracing::info!(
                path = %path.display(),
                retailers = catalog.retailers().len(),
                "loaded retailer catalog override"
            );
            Ok(catalog)
        }
        None => Ok(RetailerCatalog::builtin()),
    }
}

fn validate_catalog(catalog: &RetailerCatalog) -> Result<(), ConfigError> {
    if catalog.retailers.is_empty() {
        return Err(ConfigError::Validation(
            "at least one retailer is required".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();
    for retailer in &catalog.retailers {
        if retailer.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "retailer name must be non-empty".to_string(),
            ));
        }
        if retailer.domain.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "retailer '{}' has an empty domain",
                retailer.name
            )));
        }
        if retailer.product_patterns.iter().all(|p| p.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "retailer '{}' needs at least one product pattern",
                retailer.name
            )));
        }
        if !seen_names.insert(retailer.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate retailer name: '{}'",
                retailer.name
            )));
        }
    }

    for (i, a) in catalog.retailers.iter().enumerate() {
        for b in &catalog.retailers[i + 1..] {
            if domains_overlap(&a.domain, &b.domain) {
                return Err(ConfigError::Validation(format!(
                    "retailers '{}' and '{}' have overlapping domains ({} / {})",
                    a.name, b.name, a.domain, b.domain
                )));
            }
        }
    }

    Ok(())
}

fn domains_overlap(a: &str, b: &str) -> bool {
    let a = a.trim().to_ascii_lowercase();
    let b = b.trim().to_ascii_lowercase();
    a == b || a.ends_with(&format!(".{b}")) || b.ends_with(&format!(".{a}"))
}
