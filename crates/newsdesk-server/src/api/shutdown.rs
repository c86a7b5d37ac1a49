use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ShutdownData {
    status: &'static str,
}

/// Accepts an authenticated shutdown request and signals the server to drain.
///
/// The bearer check runs in middleware; reaching this handler means the
/// caller presented the configured secret.
pub(super) async fn request_shutdown(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> (StatusCode, Json<ApiResponse<ShutdownData>>) {
    tracing::info!(request_id = %req_id.0, "shutdown requested over http");
    state.shutdown.trigger();

    (
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: ShutdownData {
                status: "shutting_down",
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}
