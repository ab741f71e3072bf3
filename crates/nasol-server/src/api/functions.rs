//! The two function endpoints: collection run and thumbnail back-fill.

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use nasol_ingest::{normalize_limit, run_news_collection, run_thumbnail_enrichment};
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
struct EnrichSuccess {
    success: bool,
    scanned: usize,
    updated: u64,
    failed: u64,
    elapsed_ms: i64,
}

#[derive(Debug, Serialize)]
struct EnrichFailure {
    success: bool,
    error: String,
    elapsed_ms: i64,
}

fn preflight_ok() -> Response {
    (StatusCode::OK, "ok").into_response()
}

/// Runs one collection pass. Any method other than `OPTIONS` triggers it.
pub(super) async fn scheduled_news_fetch(State(state): State<AppState>, method: Method) -> Response {
    if method == Method::OPTIONS {
        return preflight_ok();
    }

    let report = run_news_collection(&state.config, &state.program, state.store.as_ref()).await;
    let status = if report.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(report)).into_response()
}

/// Back-fills thumbnails for up to `limit` articles (`POST {"limit": n}`).
///
/// The body is optional; a missing, malformed or out-of-range limit falls
/// back to the default batch size.
pub(super) async fn enrich_thumbnails(
    State(state): State<AppState>,
    method: Method,
    body: Bytes,
) -> Response {
    if method == Method::OPTIONS {
        return preflight_ok();
    }
    if method != Method::POST {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(serde_json::json!({ "error": "Method not allowed" })),
        )
            .into_response();
    }

    let limit = normalize_limit(requested_limit(&body));
    let (result, elapsed_ms) =
        run_thumbnail_enrichment(&state.config, state.store.as_ref(), limit).await;

    match result {
        Ok(report) => (
            StatusCode::OK,
            Json(EnrichSuccess {
                success: true,
                scanned: report.scanned,
                updated: report.updated,
                failed: report.failed,
                elapsed_ms,
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(EnrichFailure {
                success: false,
                error: e.to_string(),
                elapsed_ms,
            }),
        )
            .into_response(),
    }
}

fn requested_limit(body: &[u8]) -> Option<i64> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()?
        .get("limit")?
        .as_i64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_limit_is_lenient() {
        assert_eq!(requested_limit(br#"{"limit": 30}"#), Some(30));
        assert_eq!(requested_limit(br#"{"limit": "30"}"#), None);
        assert_eq!(requested_limit(b"{}"), None);
        assert_eq!(requested_limit(b""), None);
        assert_eq!(requested_limit(b"garbage"), None);
    }
}
