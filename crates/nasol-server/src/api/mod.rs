mod community;
mod feed;
mod functions;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{any, get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use nasol_core::{AppConfig, ProgramProfile};
use nasol_ingest::ArticleStore;
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::{request_id, require_service_key, FunctionAuth, RequestId};

/// Preflight responses may be cached for a day.
const CORS_MAX_AGE: Duration = Duration::from_secs(86_400);

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub program: Arc<ProgramProfile>,
    pub store: Arc<dyn ArticleStore>,
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

/// JSON error body: `{"success": false, "error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    success: bool,
    error: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
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
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            success: false,
            error: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: &str, error: &nasol_db::DbError) -> ApiError {
    tracing::error!(request_id, error = %error, "database query failed");
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "database query failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(CORS_MAX_AGE)
}

fn function_router(auth: FunctionAuth) -> Router<AppState> {
    Router::new()
        .route(
            "/functions/v1/scheduled-news-fetch",
            any(functions::scheduled_news_fetch),
        )
        .route(
            "/functions/v1/enrich-thumbnails",
            any(functions::enrich_thumbnails),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            auth,
            require_service_key,
        ))
}

pub fn build_app(state: AppState, auth: FunctionAuth) -> Router {
    let public_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/feed", get(feed::list_feed))
        .route(
            "/api/community/posts",
            get(community::list_posts).post(community::create_post),
        )
        .route("/api/community/posts/{id}", get(community::get_post))
        .route("/api/community/comments", post(community::create_comment));

    Router::new()
        .merge(public_routes)
        .merge(function_router(auth))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(request_id))
                .layer(build_cors()),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match nasol_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use nasol_core::{CastTables, DedupConfig, Environment, RelevanceRules};
    use nasol_ingest::MemoryStore;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::path::PathBuf;
    use tower::ServiceExt;

    pub(super) fn test_config() -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/unused".to_string(),
            env: Environment::Test,
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
            log_level: "debug".to_string(),
            program_path: PathBuf::from("./config/program.yaml"),
            db_max_connections: 1,
            db_min_connections: 0,
            db_acquire_timeout_secs: 1,
            naver_client_id: None,
            naver_client_secret: None,
            search_base_url: "http://127.0.0.1:9".to_string(),
            service_key: Some("service-key".to_string()),
            enrich_endpoint: "http://127.0.0.1:9/functions/v1/enrich-thumbnails".to_string(),
            hf_api_token: None,
            embedding_base_url: "http://127.0.0.1:9".to_string(),
            embedding_timeout_secs: 1,
            thumbnail_timeout_secs: 1,
            dedup: DedupConfig::default(),
            collect_cron: "0 0 * * * *".to_string(),
            require_function_auth: false,
        }
    }

    pub(super) fn test_program() -> ProgramProfile {
        ProgramProfile {
            name: "나는솔로".to_string(),
            keywords: vec!["나는솔로".to_string()],
            relevance: RelevanceRules {
                phrases: vec!["나는솔로".to_string()],
                tokens: vec!["나솔".to_string()],
            },
            cast: CastTables {
                roster: vec!["영수".to_string()],
                honorifics: vec!["씨".to_string()],
            },
        }
    }

    fn lazy_pool() -> PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(1))
            .connect_lazy("postgres://localhost/unused")
            .expect("lazy pool")
    }

    fn app_with(store: Arc<MemoryStore>, auth: FunctionAuth) -> Router {
        let state = AppState {
            pool: lazy_pool(),
            config: Arc::new(test_config()),
            program: Arc::new(test_program()),
            store,
        };
        build_app(state, auth)
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json parse")
    }

    #[tokio::test]
    async fn plain_options_returns_ok_text() {
        let app = app_with(Arc::new(MemoryStore::new()), FunctionAuth::disabled());
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/functions/v1/scheduled-news-fetch")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn cors_preflight_is_permissive() {
        let app = app_with(Arc::new(MemoryStore::new()), FunctionAuth::with_key("k"));
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/functions/v1/enrich-thumbnails")
                    .header("origin", "https://nasol.example")
                    .header("access-control-request-method", "POST")
                    .header("access-control-request-headers", "authorization, content-type")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-max-age"], "86400");
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let app = app_with(Arc::new(MemoryStore::new()), FunctionAuth::disabled());
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/functions/v1/enrich-thumbnails")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn function_call_without_key_is_unauthorized() {
        let app = app_with(Arc::new(MemoryStore::new()), FunctionAuth::with_key("k"));
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/functions/v1/scheduled-news-fetch")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({ "error": "Unauthorized" })
        );
    }

    #[tokio::test]
    async fn collection_without_credentials_is_500_naming_the_variable() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with(Arc::clone(&store), FunctionAuth::with_key("k"));
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/functions/v1/scheduled-news-fetch")
                    .header("authorization", "Bearer k")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"]
            .as_str()
            .unwrap_or_default()
            .contains("NAVER_CLIENT_ID"));
        assert_eq!(store.logs().len(), 1);
    }

    #[tokio::test]
    async fn enrich_rejects_get() {
        let app = app_with(Arc::new(MemoryStore::new()), FunctionAuth::disabled());
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/functions/v1/enrich-thumbnails")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({ "error": "Method not allowed" })
        );
    }

    #[tokio::test]
    async fn enrich_with_nothing_to_do_reports_zeroes() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with(Arc::clone(&store), FunctionAuth::disabled());
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/functions/v1/enrich-thumbnails")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"limit": 500}"#))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["scanned"], 0);
        assert_eq!(json["updated"], 0);
        assert_eq!(json["failed"], 0);
        assert!(json["elapsed_ms"].is_i64());
        assert_eq!(store.logs().len(), 1);
    }

    #[tokio::test]
    async fn enrich_storage_failure_is_500() {
        let store = Arc::new(MemoryStore::new());
        store.fail_selects(true);
        let app = app_with(Arc::clone(&store), FunctionAuth::disabled());
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/functions/v1/enrich-thumbnails")
                    .body(Body::from("not json"))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].is_string());
        assert!(json["elapsed_ms"].is_i64());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn health_reports_database_ok(pool: sqlx::PgPool) {
        let state = AppState {
            pool,
            config: Arc::new(test_config()),
            program: Arc::new(test_program()),
            store: Arc::new(MemoryStore::new()),
        };
        let response = build_app(state, FunctionAuth::disabled())
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["data"]["database"], "ok");
    }
}
