//! Raw response shapes from the `SerpAPI` search endpoint.
//!
//! Result entries vary widely between engines and verticals, so each one is
//! kept as an untyped JSON value behind [`ResultFragment`] and read through
//! JSON-pointer accessors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level `search.json` body. Only the fields the pipeline reads are typed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub organic_results: Vec<ResultFragment>,
    #[serde(default)]
    pub shopping_results: Vec<ResultFragment>,
}

impl SearchResponse {
    /// Organic results followed by shopping results.
    #[must_use]
    pub fn into_fragments(self) -> Vec<ResultFragment> {
        let mut fragments = self.organic_results;
        fragments.extend(self.shopping_results);
        fragments
    }
}

/// One raw search-result entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultFragment(pub Value);

impl ResultFragment {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Value at a JSON pointer (e.g. `/rich_snippet/top/image`).
    #[must_use]
    pub fn value_at(&self, pointer: &str) -> Option<&Value> {
        self.0.pointer(pointer).filter(|v| !v.is_null())
    }

    /// Non-empty trimmed string at a JSON pointer.
    #[must_use]
    pub fn str_at(&self, pointer: &str) -> Option<&str> {
        self.value_at(pointer)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The result's outbound link. Shopping results use `product_link`.
    #[must_use]
    pub fn link(&self) -> Option<&str> {
        self.str_at("/link")
            .or_else(|| self.str_at("/product_link"))
            .or_else(|| self.str_at("/product_url"))
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.str_at("/title")
    }

    #[must_use]
    pub fn snippet(&self) -> Option<&str> {
        self.str_at("/snippet")
    }
}
