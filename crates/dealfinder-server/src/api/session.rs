use axum::{extract::State, Extension, Json};
use dealfinder_core::QuotaStatus;

use crate::middleware::{RequestId, SessionId};

use super::{ApiResponse, AppState, ResponseMeta};

/// `GET /api/session`: quota status for the caller's session.
pub(super) async fn get_session(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<SessionId>,
) -> Json<ApiResponse<QuotaStatus>> {
    Json(ApiResponse {
        data: state.quota.status(&session.0),
        meta: ResponseMeta::new(req_id.0),
    })
}
