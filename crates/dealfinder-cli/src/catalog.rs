//! Read-only retailer catalog commands.

use dealfinder_core::{AppConfig, RetailerCatalog};
use dealfinder_search::classify_url;

/// Print every configured retailer with its product URL patterns.
///
/// # Errors
///
/// Returns an error if a `DEALFINDER_RETAILERS_PATH` override cannot be loaded.
pub(crate) fn run_retailers(config: &AppConfig) -> anyhow::Result<()> {
    let catalog = dealfinder_core::load_catalog(config)?;
    for line in retailer_lines(&catalog) {
        println!("{line}");
    }
    Ok(())
}

/// Print which retailer owns `url` and whether it looks like a product page.
///
/// # Errors
///
/// Returns an error if a `DEALFINDER_RETAILERS_PATH` override cannot be loaded.
pub(crate) fn run_classify(config: &AppConfig, url: &str) -> anyhow::Result<()> {
    let catalog = dealfinder_core::load_catalog(config)?;
    println!("{}", describe_url(&catalog, url));
    Ok(())
}

fn retailer_lines(catalog: &RetailerCatalog) -> Vec<String> {
    let mut lines = vec![format!("{:<12}{:<16}PRODUCT PATTERNS", "NAME", "DOMAIN")];
    lines.extend(catalog.retailers().iter().map(|r| {
        format!(
            "{:<12}{:<16}{}",
            r.name,
            r.domain,
            r.product_patterns.join(" ")
        )
    }));
    lines
}

fn describe_url(catalog: &RetailerCatalog, url: &str) -> String {
    match classify_url(url, catalog) {
        Some((retailer, true)) => format!("{}: product page", retailer.name),
        Some((retailer, false)) => format!("{}: not a product page", retailer.name),
        None => "not a supported retailer".to_string(),
    }
}
