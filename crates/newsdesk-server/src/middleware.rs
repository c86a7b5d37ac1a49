use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Shared secret guarding `POST /shutdown`.
///
/// With no secret configured every request is refused.
#[derive(Clone)]
pub struct ShutdownAuth {
    token: Option<Arc<str>>,
}

impl ShutdownAuth {
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token
                .map(|t| t.trim().to_owned())
                .filter(|t| !t.is_empty())
                .map(Arc::from),
        }
    }

    fn allows(&self, candidate: &str) -> bool {
        self.token
            .as_deref()
            .is_some_and(|expected| bool::from(expected.as_bytes().ct_eq(candidate.as_bytes())))
    }
}

impl std::fmt::Debug for ShutdownAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownAuth")
            .field("configured", &self.token.is_some())
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for MiddlewareErrorBody {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware admitting only requests that carry the shutdown secret.
pub async fn require_shutdown_token(
    State(auth): State<ShutdownAuth>,
    req: Request,
    next: Next,
) -> Response {
    let token = extract_bearer_token(req.headers().get(AUTHORIZATION));

    match token {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => {
            tracing::warn!(
                configured = auth.token.is_some(),
                "rejected shutdown request: missing or invalid bearer token"
            );
            MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "unauthorized",
                    message: "missing or invalid bearer token",
                },
            }
            .into_response()
        }
    }
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn extract_bearer_token_rejects_empty_token() {
        let header = HeaderValue::from_static("Bearer   ");
        assert_eq!(extract_bearer_token(Some(&header)), None);
        assert_eq!(extract_bearer_token(None), None);
    }

    #[test]
    fn shutdown_auth_matches_only_configured_token() {
        let auth = ShutdownAuth::new(Some("s3cret".to_string()));
        assert!(auth.allows("s3cret"));
        assert!(!auth.allows("s3cre"));
        assert!(!auth.allows("s3cret-and-more"));
    }

    #[test]
    fn shutdown_auth_without_token_refuses_everything() {
        let auth = ShutdownAuth::new(None);
        assert!(!auth.allows(""));
        assert!(!auth.allows("anything"));

        let blank = ShutdownAuth::new(Some("  ".to_string()));
        assert!(!blank.allows(""));
    }

    #[test]
    fn shutdown_auth_debug_hides_token() {
        let auth = ShutdownAuth::new(Some("s3cret".to_string()));
        let debug = format!("{auth:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("configured: true"));
    }
}
