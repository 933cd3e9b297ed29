//! Fan-out orchestration: one site-restricted call per retailer plus the
//! optional enrichment call, all issued concurrently.

use dealfinder_core::{AppConfig, Offer, Retailer, RetailerCatalog};
use futures::future::join_all;

use crate::client::SerpApiClient;
use crate::enrich::EnrichmentIndex;
use crate::error::{ProviderError, SearchError};
use crate::merge::merge_offers;
use crate::normalize::{normalize_retailer_results, NormalizeContext};
use crate::price::PriceRange;
use crate::types::ResultFragment;

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub results_per_retailer: u32,
    pub enrichment_results: u32,
    pub enrichment_enabled: bool,
    pub fuzzy_title_match: bool,
    pub price_range: PriceRange,
}

impl SearchOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            results_per_retailer: config.results_per_retailer,
            enrichment_results: config.enrichment_results,
            enrichment_enabled: config.enrichment_enabled,
            fuzzy_title_match: config.fuzzy_title_match,
            price_range: PriceRange::new(config.price_max),
        }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            results_per_retailer: 15,
            enrichment_results: 20,
            enrichment_enabled: true,
            fuzzy_title_match: false,
            price_range: PriceRange::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Offers(Vec<Offer>),
    /// The fan-out succeeded but nothing survived filtering.
    NoResults,
}

impl SearchOutcome {
    #[must_use]
    pub fn offers(&self) -> &[Offer] {
        match self {
            SearchOutcome::Offers(offers) => offers,
            SearchOutcome::NoResults => &[],
        }
    }
}

#[derive(Debug)]
pub struct Aggregator {
    client: SerpApiClient,
    catalog: RetailerCatalog,
    options: SearchOptions,
}

impl Aggregator {
    #[must_use]
    pub fn new(client: SerpApiClient, catalog: RetailerCatalog, options: SearchOptions) -> Self {
        Self {
            client,
            catalog,
            options,
        }
    }

    /// Build an aggregator from application config.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::MissingCredentials`] when no API key is
    /// configured, or [`SearchError::Client`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig, catalog: RetailerCatalog) -> Result<Self, SearchError> {
        let api_key = config
            .serpapi_api_key
            .as_deref()
            .ok_or(SearchError::MissingCredentials)?;
        let client = SerpApiClient::with_base_url(
            api_key,
            config.request_timeout_secs,
            &config.user_agent,
            &config.serpapi_base_url,
        )?;
        Ok(Self::new(client, catalog, SearchOptions::from_config(config)))
    }

    #[must_use]
    pub fn catalog(&self) -> &RetailerCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Run a full search: fan out, normalize, merge, and rank.
    ///
    /// Individual call failures are logged and treated as empty results.
    ///
    /// # Errors
    ///
    /// - [`SearchError::EmptyQuery`] if `query` is blank.
    /// - [`SearchError::Provider`] if every call failed and the provider
    ///   reported at least one of the failures.
    /// - [`SearchError::Unavailable`] if every call failed at the transport level.
    pub async fn search(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let retailer_calls = self.catalog.retailers().iter().map(|retailer| async move {
            let result = self
                .client
                .site_search(query, &retailer.domain, self.options.results_per_retailer)
                .await;
            (retailer, result)
        });
        let enrichment_call = async {
            if self.options.enrichment_enabled {
                Some(
                    self.client
                        .shopping_search(query, self.options.enrichment_results)
                        .await,
                )
            } else {
                None
            }
        };

        let (retailer_results, enrichment_result) =
            tokio::join!(join_all(retailer_calls), enrichment_call);

        let mut failures: Vec<ProviderError> = Vec::new();
        let mut per_retailer: Vec<(&Retailer, Vec<ResultFragment>)> = Vec::new();

        for (retailer, result) in retailer_results {
            match result {
                Ok(fragments) => {
                    tracing::debug!(
                        retailer = %retailer.name,
                        count = fragments.len(),
                        "retailer search returned"
                    );
                    per_retailer.push((retailer, fragments));
                }
                Err(e) => {
                    tracing::warn!(retailer = %retailer.name, error = %e, "retailer search failed");
                    failures.push(e);
                }
            }
        }

        let enrichment_fragments = match enrichment_result {
            Some(Ok(fragments)) => fragments,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "enrichment search failed");
                failures.push(e);
                Vec::new()
            }
            None => Vec::new(),
        };

        let attempted = self.catalog.retailers().len() + usize::from(self.options.enrichment_enabled);
        if attempted > 0 && failures.len() == attempted {
            return Err(total_failure(attempted, &failures));
        }

        let index = EnrichmentIndex::build(
            &enrichment_fragments,
            &self.catalog,
            &self.options.price_range,
        );
        let ctx = NormalizeContext {
            index: &index,
            range: &self.options.price_range,
            fuzzy_title_match: self.options.fuzzy_title_match,
        };

        let offers: Vec<Offer> = per_retailer
            .iter()
            .flat_map(|(retailer, fragments)| normalize_retailer_results(fragments, retailer, &ctx))
            .collect();
        let merged = merge_offers(
            offers,
            &index,
            &self.catalog,
            self.options.fuzzy_title_match,
        );

        tracing::info!(
            query,
            offers = merged.len(),
            failed_calls = failures.len(),
            "search complete"
        );

        if merged.is_empty() {
            Ok(SearchOutcome::NoResults)
        } else {
            Ok(SearchOutcome::Offers(merged))
        }
    }
}

fn total_failure(attempted: usize, failures: &[ProviderError]) -> SearchError {
    if let Some(reported) = failures.iter().find(|e| e.is_provider_reported()) {
        let message = match reported {
            ProviderError::Api(msg) => msg.clone(),
            other => other.to_string(),
        };
        return SearchError::Provider { message };
    }
    let last_error = failures
        .last()
        .map_or_else(|| "unknown error".to_string(), ToString::to_string);
    SearchError::Unavailable {
        attempted,
        last_error,
    }
}
