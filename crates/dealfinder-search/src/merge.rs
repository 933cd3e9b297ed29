//! Merge, deduplicate, filter, and sort offers from every source.

use std::collections::HashMap;

use dealfinder_core::{Offer, RetailerCatalog};

use crate::classify::is_product_page;
use crate::enrich::{titles_similar, EnrichmentIndex, EnrichmentRecord};

/// Combine enrichment records and per-retailer offers into the final list.
///
/// Enrichment records on a catalog retailer's product page seed the set. Retailer
/// offers whose canonical link is already present are dropped; with
/// `fuzzy_title_match`, so is an offer whose retailer already has a seeded
/// record with a similar title (the record takes the offer's image if it had
/// none). Survivors must pass the product-page classifier and are sorted by
/// price, unknown prices last, ties in encounter order.
#[must_use]
pub fn merge_offers(
    retailer_offers: Vec<Offer>,
    index: &EnrichmentIndex,
    catalog: &RetailerCatalog,
    fuzzy_title_match: bool,
) -> Vec<Offer> {
    let mut merged: Vec<Offer> = index
        .retailer_records()
        .filter(|record| record.product_page)
        .filter_map(EnrichmentRecord::to_offer)
        .collect();
    let seeded = merged.len();
    let mut positions: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, o)| (o.url.clone(), i))
        .collect();

    let mut exact_dupes = 0usize;
    let mut fuzzy_dupes = 0usize;

    for offer in retailer_offers {
        if positions.contains_key(&offer.url) {
            exact_dupes += 1;
            continue;
        }

        if fuzzy_title_match {
            let similar = merged[..seeded]
                .iter_mut()
                .find(|s| s.source == offer.source && titles_similar(&s.title, &offer.title));
            if let Some(seed) = similar {
                if seed.image.is_none() {
                    seed.image.clone_from(&offer.image);
                }
                fuzzy_dupes += 1;
                continue;
            }
        }

        positions.insert(offer.url.clone(), merged.len());
        merged.push(offer);
    }

    let before_filter = merged.len();
    merged.retain(|offer| {
        catalog
            .match_url(&offer.url)
            .is_some_and(|retailer| is_product_page(&offer.url, retailer, catalog))
    });

    tracing::debug!(
        seeded,
        exact_dupes,
        fuzzy_dupes,
        non_product = before_filter - merged.len(),
        kept = merged.len(),
        "merged offers"
    );

    sort_offers(&mut merged);
    merged
}

/// Stable ascending sort by price with unknown prices last.
pub fn sort_offers(offers: &mut [Offer]) {
    offers.sort_by(|a, b| a.price_value.cmp(&b.price_value));
}
