//! Image extraction, first non-empty strategy wins.

use std::sync::LazyLock;

use regex::Regex;

use crate::enrich::EnrichmentRecord;
use crate::types::ResultFragment;

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["']"#).expect("valid img src regex")
});

/// Provider image fields, in the order they are trusted.
const IMAGE_POINTERS: &[&str] = &[
    "/thumbnail",
    "/image",
    "/original_image",
    "/rich_snippet/top/image",
    "/rich_snippet/top/detected_extensions/thumbnail",
    "/pagemap/cse_image/0/src",
    "/pagemap/cse_thumbnail/0/src",
    "/pagemap/metatags/0/og:image",
    "/pagemap/metatags/0/twitter:image",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStrategy {
    /// Image on the enrichment record for the same canonical link.
    Enrichment,
    /// A known image field on the result itself.
    ProviderField,
    /// The first `<img src>` inside `html_snippet`.
    HtmlSnippet,
    /// Image on a same-retailer enrichment record with a similar title.
    SimilarTitle,
}

pub const IMAGE_CHAIN: [ImageStrategy; 4] = [
    ImageStrategy::Enrichment,
    ImageStrategy::ProviderField,
    ImageStrategy::HtmlSnippet,
    ImageStrategy::SimilarTitle,
];

/// Inputs beyond the fragment itself that some strategies consult.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageSources<'a> {
    pub exact: Option<&'a EnrichmentRecord>,
    /// Only populated when fuzzy title matching is enabled.
    pub similar: Option<&'a EnrichmentRecord>,
}

impl ImageStrategy {
    #[must_use]
    pub fn extract(self, fragment: &ResultFragment, sources: ImageSources<'_>) -> Option<String> {
        match self {
            ImageStrategy::Enrichment => sources.exact.and_then(|r| r.image.clone()),
            ImageStrategy::ProviderField => IMAGE_POINTERS
                .iter()
                .find_map(|ptr| fragment.str_at(ptr))
                .map(str::to_string),
            ImageStrategy::HtmlSnippet => fragment
                .str_at("/html_snippet")
                .and_then(|html| IMG_SRC.captures(html))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty()),
            ImageStrategy::SimilarTitle => sources.similar.and_then(|r| r.image.clone()),
        }
    }
}

/// Run the image chain; `None` when every strategy comes up empty.
#[must_use]
pub fn extract_image(fragment: &ResultFragment, sources: ImageSources<'_>) -> Option<String> {
    IMAGE_CHAIN
        .iter()
        .find_map(|strategy| {
            strategy
                .extract(fragment, sources)
                .filter(|s| !s.trim().is_empty())
        })
}
