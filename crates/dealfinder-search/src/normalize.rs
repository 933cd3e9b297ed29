//! Convert raw per-retailer fragments into [`Offer`]s.

use dealfinder_core::{Offer, Retailer};
use reqwest::Url;

use crate::enrich::EnrichmentIndex;
use crate::image::{extract_image, ImageSources};
use crate::price::{extract_price, price_fields, PriceRange};
use crate::types::ResultFragment;

pub const DEFAULT_TITLE: &str = "Product";

/// Deduplication key for a product link.
///
/// Parses the link, drops any `#fragment`, and trims a trailing `/` from the
/// path. Links that do not parse are returned trimmed but otherwise verbatim.
#[must_use]
pub fn canonical_link(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut url) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };
    url.set_fragment(None);
    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }
    url.to_string()
}

/// Shared, read-only inputs for normalizing one search.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext<'a> {
    pub index: &'a EnrichmentIndex,
    pub range: &'a PriceRange,
    pub fuzzy_title_match: bool,
}

/// Build an offer from one fragment returned for `retailer`.
///
/// Returns `None` when the fragment has no link or the link is not on the
/// retailer's domain.
#[must_use]
pub fn normalize_fragment(
    fragment: &ResultFragment,
    retailer: &Retailer,
    ctx: &NormalizeContext<'_>,
) -> Option<Offer> {
    let link = canonical_link(fragment.link()?);
    if !retailer.owns_url(&link) {
        return None;
    }

    let title = fragment.title().unwrap_or(DEFAULT_TITLE);
    let exact = ctx.index.get(&link);
    let similar = if ctx.fuzzy_title_match && exact.is_none() {
        ctx.index.find_similar(&retailer.name, title)
    } else {
        None
    };

    let price = extract_price(fragment, exact, ctx.range);
    let (price_display, price_value) = price_fields(price.as_ref());
    let image = extract_image(fragment, ImageSources { exact, similar });

    Some(Offer {
        title: title.to_string(),
        price_display,
        price_value,
        source: retailer.name.clone(),
        url: link,
        image,
    })
}

/// Normalize every fragment for one retailer, dropping malformed ones.
#[must_use]
pub fn normalize_retailer_results(
    fragments: &[ResultFragment],
    retailer: &Retailer,
    ctx: &NormalizeContext<'_>,
) -> Vec<Offer> {
    let offers: Vec<Offer> = fragments
        .iter()
        .filter_map(|f| normalize_fragment(f, retailer, ctx))
        .collect();
    tracing::debug!(
        retailer = %retailer.name,
        raw = fragments.len(),
        offers = offers.len(),
        "normalized retailer results"
    );
    offers
}

#[cfg(test)]
mod tests {
    use dealfinder_core::{PriceValue, RetailerCatalog, CHECK_WEBSITE};
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    fn fragments(values: serde_json::Value) -> Vec<ResultFragment> {
        serde_json::from_value(values).unwrap()
    }

    fn normalize_with(
        values: serde_json::Value,
        index: &EnrichmentIndex,
        fuzzy: bool,
    ) -> Vec<Offer> {
        let catalog = RetailerCatalog::builtin();
        let retailer = catalog.find_by_name("Amazon").unwrap().clone();
        let range = PriceRange::default();
        let ctx = NormalizeContext {
            index,
            range: &range,
            fuzzy_title_match: fuzzy,
        };
        normalize_retailer_results(&fragments(values), &retailer, &ctx)
    }

    #[test]
    fn canonical_link_strips_fragment_and_trailing_slash() {
        assert_eq!(
            canonical_link(" https://WWW.Amazon.com/dp/B1/#top "),
            "https://www.amazon.com/dp/B1"
        );
        assert_eq!(
            canonical_link("https://www.ebay.com/itm/1?var=2"),
            "https://www.ebay.com/itm/1?var=2"
        );
        assert_eq!(canonical_link("https://www.target.com/"), "https://www.target.com/");
    }

    #[test]
    fn canonical_link_keeps_unparseable_input() {
        assert_eq!(canonical_link("  not a url "), "not a url");
    }

    #[test]
    fn fragments_without_link_are_dropped() {
        let offers = normalize_with(
            json!([{ "title": "No link", "extracted_price": 10 }]),
            &EnrichmentIndex::default(),
            false,
        );
        assert!(offers.is_empty());
    }

    #[test]
    fn foreign_domain_links_are_dropped() {
        let offers = normalize_with(
            json!([{ "title": "Elsewhere", "link": "https://www.walmart.com/ip/1" }]),
            &EnrichmentIndex::default(),
            false,
        );
        assert!(offers.is_empty());
    }

    #[test]
    fn missing_title_and_price_use_defaults() {
        let offers = normalize_with(
            json!([{ "link": "https://www.amazon.com/dp/B1" }]),
            &EnrichmentIndex::default(),
            false,
        );
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].title, DEFAULT_TITLE);
        assert_eq!(offers[0].price_display, CHECK_WEBSITE);
        assert_eq!(offers[0].price_value, PriceValue::Unknown);
        assert_eq!(offers[0].source, "Amazon");
    }

    #[test]
    fn enrichment_fills_price_and_image() {
        let catalog = RetailerCatalog::builtin();
        let index = EnrichmentIndex::build(
            &fragments(json!([{
                "title": "Mouse",
                "link": "https://www.amazon.com/dp/B1",
                "extracted_price": 22.5,
                "thumbnail": "https://img.example/b1.jpg"
            }])),
            &catalog,
            &PriceRange::default(),
        );
        let offers = normalize_with(
            json!([{ "title": "Mouse", "link": "https://www.amazon.com/dp/B1/" }]),
            &index,
            false,
        );
        assert_eq!(offers[0].price_value, PriceValue::Known(Decimal::new(225, 1)));
        assert_eq!(offers[0].image.as_deref(), Some("https://img.example/b1.jpg"));
    }

    #[test]
    fn similar_title_image_only_when_fuzzy_enabled() {
        let catalog = RetailerCatalog::builtin();
        let index = EnrichmentIndex::build(
            &fragments(json!([{
                "title": "Logitech Wireless Mouse",
                "link": "https://www.amazon.com/dp/OTHER",
                "thumbnail": "https://img.example/other.jpg"
            }])),
            &catalog,
            &PriceRange::default(),
        );
        let raw = json!([{ "title": "Logitech Mouse Wireless M185", "link": "https://www.amazon.com/dp/B1" }]);

        let off = normalize_with(raw.clone(), &index, false);
        assert!(off[0].image.is_none());

        let on = normalize_with(raw, &index, true);
        assert_eq!(on[0].image.as_deref(), Some("https://img.example/other.jpg"));
    }
}
