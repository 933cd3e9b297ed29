mod search;
mod session;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use dealfinder_core::{InMemorySessionStore, QuotaService, SystemClock};
use dealfinder_search::{Aggregator, SearchError};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, session_id, RateLimitState, RequestId, REQUEST_ID_HEADER,
    SESSION_ID_HEADER,
};

pub type Quota = QuotaService<InMemorySessionStore, SystemClock>;

#[derive(Clone)]
pub struct AppState {
    /// `None` when no provider key is configured; searches answer `config_error`.
    pub search: Option<Arc<Aggregator>>,
    pub quota: Arc<Quota>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    provider: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "bad_request" => StatusCode::BAD_REQUEST,
            "quota_exceeded" | "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "provider_error" => StatusCode::BAD_GATEWAY,
            "provider_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_search_error(request_id: String, error: &SearchError) -> ApiError {
    match error {
        SearchError::EmptyQuery => ApiError::new(request_id, "bad_request", error.to_string()),
        SearchError::MissingCredentials | SearchError::Client(_) => {
            tracing::error!(error = %error, "search is misconfigured");
            ApiError::new(request_id, "config_error", error.to_string())
        }
        SearchError::Provider { message } => {
            tracing::warn!(error = %error, "search provider reported an error");
            ApiError::new(request_id, "provider_error", message.clone())
        }
        SearchError::Unavailable { .. } => {
            tracing::warn!(error = %error, "search provider unavailable");
            ApiError::new(
                request_id,
                "provider_unavailable",
                "failed to search retailers",
            )
        }
    }
}

fn build_cors() -> CorsLayer {
    let request_header = HeaderName::from_static(REQUEST_ID_HEADER);
    let session_header = HeaderName::from_static(SESSION_ID_HEADER);
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            request_header.clone(),
            session_header.clone(),
        ])
        .expose_headers([request_header, session_header])
}

fn session_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/search", get(search::search))
        .route("/api/session", get(session::get_session))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn(session_id)),
        )
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(session_router(rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let provider = if state.search.is_some() {
        "configured"
    } else {
        "missing_key"
    };
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            provider,
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

pub fn rate_limit_state(per_minute: usize) -> RateLimitState {
    RateLimitState::new(per_minute, Duration::from_secs(60))
}
