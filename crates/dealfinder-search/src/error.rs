use thiserror::Error;

/// Errors returned by the `SerpAPI` client for a single call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network, TLS, or body-read failure from the underlying HTTP client.
    ///
    /// The request URL is stripped before storage because it carries the API key.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The provider rejected the API key (HTTP 401/403).
    #[error("provider rejected credentials (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// The provider is throttling this account (HTTP 429).
    #[error("provider rate limit exceeded: {message}")]
    RateLimited { message: String },

    /// Any other non-2xx response.
    #[error("unexpected HTTP {status} from provider for {context}")]
    UnexpectedStatus { status: u16, context: String },

    /// The response carried a top-level `"error"` field.
    #[error("SerpAPI error: {0}")]
    Api(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}

impl ProviderError {
    /// `true` when the provider itself explained the failure, as opposed to a
    /// transport problem or an unreadable body.
    #[must_use]
    pub fn is_provider_reported(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. } | Self::RateLimited { .. } | Self::Api(_)
        )
    }
}

/// Whole-pipeline failures surfaced to the caller of a search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search query must not be empty")]
    EmptyQuery,

    #[error("SERPAPI_KEY environment variable is required")]
    MissingCredentials,

    /// Every provider call failed and at least one failure came from the provider.
    #[error("search provider error: {message}")]
    Provider { message: String },

    /// Every provider call failed with transport-level errors.
    #[error("search provider unavailable: all {attempted} calls failed (last error: {last_error})")]
    Unavailable { attempted: usize, last_error: String },

    #[error(transparent)]
    Client(#[from] ProviderError),
}
