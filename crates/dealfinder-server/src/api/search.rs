use axum::{
    extract::{Query, State},
    Extension, Json,
};
use dealfinder_core::{Offer, QuotaStatus};
use dealfinder_search::{SearchError, SearchOutcome};
use serde::{Deserialize, Serialize};

use crate::middleware::{RequestId, SessionId};

use super::{map_search_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct SearchParams {
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct OfferItem {
    #[serde(flatten)]
    offer: Offer,
    /// `image`, or a placeholder labelled with the title.
    display_image: String,
}

impl From<Offer> for OfferItem {
    fn from(offer: Offer) -> Self {
        Self {
            display_image: offer.display_image(),
            offer,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SearchData {
    status: &'static str,
    query: String,
    offers: Vec<OfferItem>,
    quota: QuotaStatus,
}

/// `GET /api/search?query=`.
///
/// The quota is checked and counted in one step before any provider call, and
/// only once the request is known to be serviceable.
pub(super) async fn search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<SessionId>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<SearchData>>, ApiError> {
    let query = params.query.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "bad_request",
            "Missing query parameter",
        ));
    }

    let Some(aggregator) = state.search.as_ref() else {
        return Err(map_search_error(req_id.0, &SearchError::MissingCredentials));
    };

    let quota = match state.quota.try_record_search(&session.0) {
        Ok(quota) => quota,
        Err(rejected) => {
            let premium_daily = state.quota.limits().premium_daily;
            let limit = rejected.search_limit.unwrap_or(premium_daily);
            tracing::info!(session_id = %session.0, limit, "search rejected: daily quota reached");
            return Err(ApiError::new(
                req_id.0,
                "quota_exceeded",
                format!(
                    "You've reached your daily search limit ({limit} searches/day). Upgrade to Premium for {premium_daily} searches/day!"
                ),
            ));
        }
    };
    tracing::info!(
        session_id = %session.0,
        query,
        remaining = %quota.remaining,
        "search accepted"
    );

    let outcome = aggregator
        .search(query)
        .await
        .map_err(|e| map_search_error(req_id.0.clone(), &e))?;

    let (status, offers) = match outcome {
        SearchOutcome::Offers(offers) => ("ok", offers),
        SearchOutcome::NoResults => ("no_results", Vec::new()),
    };

    Ok(Json(ApiResponse {
        data: SearchData {
            status,
            query: query.to_string(),
            offers: offers.into_iter().map(OfferItem::from).collect(),
            quota,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
