//! Price extraction.
//!
//! A fixed chain of strategies each propose zero or more candidates; the first
//! candidate inside the accepted [`PriceRange`] wins.

use std::str::FromStr;
use std::sync::LazyLock;

use dealfinder_core::{format_usd, PriceValue, CHECK_WEBSITE};
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::enrich::EnrichmentRecord;
use crate::types::ResultFragment;

const NUMBER: &str = r"(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{1,2})?";

static CURRENCY_PREFIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\$\s?({NUMBER})")).expect("valid currency-prefixed regex")
});

static CURRENCY_SUFFIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)({NUMBER})\s*USD\b")).expect("valid currency-suffixed regex")
});

static LABELED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)price[:\s]*\$?\s?({NUMBER})")).expect("valid labeled-price regex")
});

static FIRST_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?").expect("valid number regex")
});

/// Accepted price interval `(0, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    max: Decimal,
}

impl PriceRange {
    #[must_use]
    pub fn new(max: Decimal) -> Self {
        Self { max }
    }

    #[must_use]
    pub fn max(&self) -> Decimal {
        self.max
    }

    #[must_use]
    pub fn contains(&self, value: Decimal) -> bool {
        value > Decimal::ZERO && value <= self.max
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self::new(Decimal::new(100_000, 0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceStrategy {
    /// `extracted_price`, then `price`.
    StructuredField,
    /// `rich_snippet.{top,bottom}.detected_extensions.price`.
    RichSnippet,
    /// Money-looking text in the `snippet`.
    SnippetRegex,
    /// The enrichment record for the same canonical link.
    Enrichment,
}

/// Strategies in priority order.
pub const PRICE_CHAIN: [PriceStrategy; 4] = [
    PriceStrategy::StructuredField,
    PriceStrategy::RichSnippet,
    PriceStrategy::SnippetRegex,
    PriceStrategy::Enrichment,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceCandidate {
    pub value: Decimal,
    /// Provider-supplied display text; `None` means format the value.
    pub display: Option<String>,
}

impl PriceCandidate {
    fn formatted(value: Decimal) -> Self {
        Self {
            value,
            display: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPrice {
    pub display: String,
    pub value: Decimal,
    pub strategy: PriceStrategy,
}

impl PriceStrategy {
    /// Every candidate this strategy can read from the fragment, in order.
    #[must_use]
    pub fn candidates(
        self,
        fragment: &ResultFragment,
        enrichment: Option<&EnrichmentRecord>,
    ) -> Vec<PriceCandidate> {
        match self {
            PriceStrategy::StructuredField => {
                let mut out = Vec::new();
                if let Some(value) = fragment.value_at("/extracted_price").and_then(json_decimal) {
                    out.push(PriceCandidate::formatted(value));
                }
                match fragment.value_at("/price") {
                    Some(Value::String(raw)) => {
                        if let Some(value) = parse_price_text(raw) {
                            out.push(PriceCandidate {
                                value,
                                display: Some(raw.trim().to_string()),
                            });
                        }
                    }
                    Some(other) => {
                        if let Some(value) = json_decimal(other) {
                            out.push(PriceCandidate::formatted(value));
                        }
                    }
                    None => {}
                }
                out
            }
            PriceStrategy::RichSnippet => [
                "/rich_snippet/top/detected_extensions/price",
                "/rich_snippet/bottom/detected_extensions/price",
            ]
            .iter()
            .filter_map(|ptr| fragment.value_at(ptr))
            .filter_map(|v| match v {
                Value::String(s) => parse_price_text(s),
                other => json_decimal(other),
            })
            .map(PriceCandidate::formatted)
            .collect(),
            PriceStrategy::SnippetRegex => fragment
                .snippet()
                .map(snippet_candidates)
                .unwrap_or_default(),
            PriceStrategy::Enrichment => enrichment
                .and_then(|record| record.price.as_ref())
                .map(|price| PriceCandidate {
                    value: price.value,
                    display: Some(price.display.clone()),
                })
                .into_iter()
                .collect(),
        }
    }
}

fn snippet_candidates(snippet: &str) -> Vec<PriceCandidate> {
    [&*CURRENCY_PREFIXED, &*CURRENCY_SUFFIXED, &*LABELED]
        .into_iter()
        .filter_map(|re| re.captures(snippet))
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| parse_number(m.as_str()))
        .map(PriceCandidate::formatted)
        .collect()
}

/// Run the full strategy chain and return the first in-range price.
#[must_use]
pub fn extract_price(
    fragment: &ResultFragment,
    enrichment: Option<&EnrichmentRecord>,
    range: &PriceRange,
) -> Option<ExtractedPrice> {
    extract_with(&PRICE_CHAIN, fragment, enrichment, range)
}

/// Run an explicit subset of the chain, in the order given.
#[must_use]
pub fn extract_with(
    chain: &[PriceStrategy],
    fragment: &ResultFragment,
    enrichment: Option<&EnrichmentRecord>,
    range: &PriceRange,
) -> Option<ExtractedPrice> {
    chain.iter().find_map(|strategy| {
        strategy
            .candidates(fragment, enrichment)
            .into_iter()
            .find(|c| range.contains(c.value))
            .map(|c| ExtractedPrice {
                display: c.display.unwrap_or_else(|| format_usd(c.value)),
                value: c.value,
                strategy: *strategy,
            })
    })
}

/// Display text and sort key for an optional extracted price.
#[must_use]
pub fn price_fields(price: Option<&ExtractedPrice>) -> (String, PriceValue) {
    match price {
        Some(p) => (p.display.clone(), PriceValue::Known(p.value)),
        None => (CHECK_WEBSITE.to_string(), PriceValue::Unknown),
    }
}

/// First number in free text such as `"$1,299.99"` or `"From 45 USD"`.
#[must_use]
pub fn parse_price_text(text: &str) -> Option<Decimal> {
    FIRST_NUMBER
        .find(text)
        .and_then(|m| parse_number(m.as_str()))
}

fn parse_number(raw: &str) -> Option<Decimal> {
    Decimal::from_str(&raw.replace(',', "")).ok()
}

fn json_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "price_test.rs"]
mod tests;
