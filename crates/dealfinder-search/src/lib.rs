//! Shopping-search pipeline: `SerpAPI` client, result normalization, and
//! ranking.
//!
//! [`Aggregator::search`] is the entry point. It fans out one site-restricted
//! query per catalog retailer plus an optional Google Shopping enrichment
//! query, then classifies, prices, deduplicates, and sorts the results.

pub mod aggregate;
pub mod classify;
pub mod client;
pub mod enrich;
pub mod error;
pub mod image;
pub mod merge;
pub mod normalize;
pub mod price;
pub mod types;

pub use aggregate::{Aggregator, SearchOptions, SearchOutcome};
pub use classify::{classify_url, is_product_page};
pub use client::SerpApiClient;
pub use enrich::{titles_similar, EnrichmentIndex, EnrichmentRecord};
pub use error::{ProviderError, SearchError};
pub use image::{extract_image, ImageSources, ImageStrategy};
pub use merge::{merge_offers, sort_offers};
pub use normalize::{canonical_link, normalize_fragment, normalize_retailer_results, NormalizeContext};
pub use price::{extract_price, ExtractedPrice, PriceRange, PriceStrategy};
pub use types::{ResultFragment, SearchResponse};
