use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer-token guard for the `/functions/v1/*` routes.
///
/// When enabled, the token must equal the configured service key.
#[derive(Clone)]
pub struct FunctionAuth {
    service_key: Option<Arc<str>>,
}

impl FunctionAuth {
    /// Builds the guard from `NASOL_REQUIRE_FUNCTION_AUTH` and
    /// `NASOL_SERVICE_KEY`.
    ///
    /// # Errors
    ///
    /// Fails when auth is required but no service key is configured.
    pub fn from_config(config: &nasol_core::AppConfig) -> anyhow::Result<Self> {
        if !config.require_function_auth {
            return Ok(Self::disabled());
        }
        match config.service_key.as_deref() {
            Some(key) => Ok(Self::with_key(key)),
            None => anyhow::bail!(
                "NASOL_REQUIRE_FUNCTION_AUTH is set but NASOL_SERVICE_KEY is missing"
            ),
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self { service_key: None }
    }

    #[must_use]
    pub fn with_key(key: &str) -> Self {
        Self {
            service_key: Some(Arc::from(key)),
        }
    }

    fn allows(&self, token: Option<&str>) -> bool {
        match (&self.service_key, token) {
            (None, _) => true,
            (Some(expected), Some(token)) => {
                bool::from(expected.as_bytes().ct_eq(token.as_bytes()))
            }
            (Some(_), None) => false,
        }
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

/// Rejects function calls lacking the service key. Preflight `OPTIONS`
/// requests always pass.
pub async fn require_service_key(
    State(auth): State<FunctionAuth>,
    req: Request,
    next: Next,
) -> Response {
    if req.method() == Method::OPTIONS {
        return next.run(req).await;
    }

    let token = extract_bearer_token(req.headers().get(AUTHORIZATION));
    if auth.allows(token) {
        return next.run(req).await;
    }

    tracing::warn!(path = %req.uri().path(), "rejected function call without valid service key");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "Unauthorized" })),
    )
        .into_response()
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
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
    fn disabled_auth_allows_anything() {
        assert!(FunctionAuth::disabled().allows(None));
    }

    #[test]
    fn keyed_auth_compares_tokens() {
        let auth = FunctionAuth::with_key("secret");
        assert!(auth.allows(Some("secret")));
        assert!(!auth.allows(Some("secre")));
        assert!(!auth.allows(Some("secret2")));
        assert!(!auth.allows(None));
    }
}
