//! Product-page classifier.
//!
//! Decides from the URL alone whether a link points at a single product or at
//! a search, browse, or category page.

use dealfinder_core::{Retailer, RetailerCatalog};

/// Returns `true` when `url` is a product page on `retailer`.
///
/// Rules, checked against the lower-cased URL:
/// 1. A URL outside the retailer's domain is never a product page.
/// 2. Any of the retailer's product patterns wins.
/// 3. Any shared navigational pattern, or a `search` path carrying a `q=`
///    parameter, marks a non-product page.
/// 4. Everything else is treated as a product page.
#[must_use]
pub fn is_product_page(url: &str, retailer: &Retailer, catalog: &RetailerCatalog) -> bool {
    if !retailer.owns_url(url) {
        return false;
    }

    let lower = url.to_lowercase();

    if retailer
        .product_patterns
        .iter()
        .any(|p| !p.is_empty() && lower.contains(&p.to_lowercase()))
    {
        return true;
    }

    if catalog
        .navigational_patterns()
        .iter()
        .any(|p| lower.contains(p.as_str()))
    {
        return false;
    }

    !(lower.contains("search") && (lower.contains("?q=") || lower.contains("&q=")))
}

/// Classify a URL against whichever catalog retailer owns it.
///
/// Returns `None` when no retailer owns the URL.
#[must_use]
pub fn classify_url<'a>(url: &str, catalog: &'a RetailerCatalog) -> Option<(&'a Retailer, bool)> {
    let retailer = catalog.match_url(url)?;
    Some((retailer, is_product_page(url, retailer, catalog)))
}
