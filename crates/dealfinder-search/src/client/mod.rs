//! HTTP client for the `SerpAPI` `search.json` endpoint.
//!
//! Two call shapes are used: a site-restricted Google web search per retailer,
//! and one unrestricted Google Shopping search that feeds the enrichment index.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::error::ProviderError;
use crate::types::{ResultFragment, SearchResponse};

pub const DEFAULT_BASE_URL: &str = "https://serpapi.com/";

/// Provider notice for a query that simply matched nothing.
const NO_RESULTS_NOTICE: &str = "hasn't returned any results";

/// Client for `SerpAPI`.
///
/// Use [`SerpApiClient::new`] for production or [`SerpApiClient::with_base_url`]
/// to point at a mock server in tests.
pub struct SerpApiClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl std::fmt::Debug for SerpApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerpApiClient")
            .field("api_key", &"[redacted]")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl SerpApiClient {
    /// Creates a client pointed at the production `SerpAPI` host.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`ProviderError::InvalidBaseUrl`] if `base_url` does
    /// not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ProviderError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Google web search restricted to one retailer domain.
    ///
    /// Returns organic results followed by any shopping results on the page.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::Api`] if the response carries an `error` field.
    /// - [`ProviderError::Unauthorized`] / [`ProviderError::RateLimited`] /
    ///   [`ProviderError::UnexpectedStatus`] on non-2xx responses.
    /// - [`ProviderError::Http`] on network failure.
    /// - [`ProviderError::Deserialize`] if the body is not the expected JSON.
    pub async fn site_search(
        &self,
        query: &str,
        domain: &str,
        num: u32,
    ) -> Result<Vec<ResultFragment>, ProviderError> {
        let q = format!("{query} site:{domain}");
        let url = self.build_url("google", &q, num)?;
        let response = self.fetch(url, &format!("site_search({domain})")).await?;
        Ok(response.into_fragments())
    }

    /// Unrestricted Google Shopping search.
    ///
    /// # Errors
    ///
    /// Same as [`SerpApiClient::site_search`].
    pub async fn shopping_search(
        &self,
        query: &str,
        num: u32,
    ) -> Result<Vec<ResultFragment>, ProviderError> {
        let url = self.build_url("google_shopping", query, num)?;
        let response = self.fetch(url, "shopping_search").await?;
        Ok(response.into_fragments())
    }

    /// Builds the `search.json` URL with percent-encoded query parameters.
    fn build_url(&self, engine: &str, q: &str, num: u32) -> Result<Url, ProviderError> {
        let mut url =
            self.base_url
                .join("search.json")
                .map_err(|e| ProviderError::InvalidBaseUrl {
                    url: self.base_url.to_string(),
                    reason: e.to_string(),
                })?;
        url.query_pairs_mut()
            .append_pair("engine", engine)
            .append_pair("q", q)
            .append_pair("num", &num.to_string())
            .append_pair("api_key", &self.api_key);
        Ok(url)
    }

    async fn fetch(&self, url: Url, context: &str) -> Result<SearchResponse, ProviderError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Self::status_error(status, &body, context));
        }

        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Deserialize {
                context: context.to_string(),
                source: e,
            })?;
        Self::check_api_error(parsed)
    }

    fn status_error(status: StatusCode, body: &str, context: &str) -> ProviderError {
        let message = serde_json::from_str::<SearchResponse>(body)
            .ok()
            .and_then(|r| r.error)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Unauthorized {
                status: status.as_u16(),
                message,
            },
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { message },
            _ => ProviderError::UnexpectedStatus {
                status: status.as_u16(),
                context: context.to_string(),
            },
        }
    }

    /// Turns a top-level `error` field into [`ProviderError::Api`], except the
    /// provider's "no results" notice, which is an empty success.
    fn check_api_error(response: SearchResponse) -> Result<SearchResponse, ProviderError> {
        match response.error.as_deref() {
            Some(msg) if msg.contains(NO_RESULTS_NOTICE) => Ok(SearchResponse::default()),
            Some(msg) => Err(ProviderError::Api(msg.to_string())),
            None => Ok(response),
        }
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
