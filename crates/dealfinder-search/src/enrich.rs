//! Enrichment index built from the unrestricted shopping search.
//!
//! Shopping results usually carry cleaner prices and images than site-restricted
//! web results, so they are indexed by canonical link and consulted as a
//! fallback when normalizing per-retailer results.

use std::collections::{HashMap, HashSet};

use dealfinder_core::{Offer, RetailerCatalog};

use crate::classify::is_product_page;
use crate::image::{extract_image, ImageSources};
use crate::normalize::{canonical_link, DEFAULT_TITLE};
use crate::price::{extract_with, price_fields, ExtractedPrice, PriceRange, PriceStrategy};
use crate::types::ResultFragment;

/// Strategies usable on an enrichment fragment. The enrichment strategy itself
/// is excluded since the record is its own source.
const ENRICHMENT_PRICE_CHAIN: [PriceStrategy; 3] = [
    PriceStrategy::StructuredField,
    PriceStrategy::RichSnippet,
    PriceStrategy::SnippetRegex,
];

/// Minimum word length counted when comparing titles.
const SIGNIFICANT_WORD_LEN: usize = 3;
/// Shared significant words needed for two titles to count as the same product.
const SIMILAR_TITLE_MIN_SHARED: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentRecord {
    /// Canonical link.
    pub link: String,
    pub title: String,
    pub price: Option<ExtractedPrice>,
    pub image: Option<String>,
    /// Name of the catalog retailer owning `link`, if any.
    pub retailer: Option<String>,
    /// `link` passes the product-page classifier for its retailer.
    pub product_page: bool,
}

impl EnrichmentRecord {
    /// Convert to an [`Offer`]. Records not owned by a retailer have no offer.
    #[must_use]
    pub fn to_offer(&self) -> Option<Offer> {
        let source = self.retailer.clone()?;
        let (price_display, price_value) = price_fields(self.price.as_ref());
        Some(Offer {
            title: self.title.clone(),
            price_display,
            price_value,
            source,
            url: self.link.clone(),
            image: self.image.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnrichmentIndex {
    records: Vec<EnrichmentRecord>,
    by_link: HashMap<String, usize>,
}

impl EnrichmentIndex {
    /// Index shopping fragments by canonical link. The first fragment for a
    /// link wins; fragments without a link are skipped.
    #[must_use]
    pub fn build(fragments: &[ResultFragment], catalog: &RetailerCatalog, range: &PriceRange) -> Self {
        let mut index = Self::default();

        for fragment in fragments {
            let Some(raw_link) = fragment.link() else {
                continue;
            };
            let link = canonical_link(raw_link);
            if index.by_link.contains_key(&link) {
                continue;
            }

            let owner = catalog.match_url(&link);
            let record = EnrichmentRecord {
                retailer: owner.map(|r| r.name.clone()),
                product_page: owner.is_some_and(|r| is_product_page(&link, r, catalog)),
                title: fragment.title().unwrap_or(DEFAULT_TITLE).to_string(),
                price: extract_with(&ENRICHMENT_PRICE_CHAIN, fragment, None, range),
                image: extract_image(fragment, ImageSources::default()),
                link: link.clone(),
            };
            index.by_link.insert(link, index.records.len());
            index.records.push(record);
        }

        tracing::debug!(
            records = index.records.len(),
            matched = index.records.iter().filter(|r| r.retailer.is_some()).count(),
            "built enrichment index"
        );
        index
    }

    #[must_use]
    pub fn get(&self, canonical: &str) -> Option<&EnrichmentRecord> {
        self.by_link.get(canonical).map(|&i| &self.records[i])
    }

    /// Records owned by a catalog retailer, in provider order.
    pub fn retailer_records(&self) -> impl Iterator<Item = &EnrichmentRecord> {
        self.records.iter().filter(|r| r.retailer.is_some())
    }

    /// First product-page record on `retailer` whose title is similar to `title`.
    #[must_use]
    pub fn find_similar(&self, retailer: &str, title: &str) -> Option<&EnrichmentRecord> {
        self.records.iter().find(|r| {
            r.product_page
                && r.retailer.as_deref() == Some(retailer)
                && titles_similar(&r.title, title)
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn significant_words(title: &str) -> HashSet<String> {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= SIGNIFICANT_WORD_LEN)
        .map(str::to_lowercase)
        .collect()
}

/// Two titles are similar when they share at least two distinct words of
/// three or more characters, ignoring case and punctuation.
#[must_use]
pub fn titles_similar(a: &str, b: &str) -> bool {
    let a = significant_words(a);
    let b = significant_words(b);
    a.intersection(&b).count() >= SIMILAR_TITLE_MIN_SHARED
}
