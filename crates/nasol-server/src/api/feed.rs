use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use nasol_core::Article;
use nasol_db::ArticleFilter;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, AppState};

const DEFAULT_FEED_LIMIT: i64 = 20;
const MAX_FEED_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub(super) struct FeedQuery {
    pub cast: Option<String>,
    pub source: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct FeedResponse {
    success: bool,
    data: Vec<Article>,
    total: i64,
    pagination: Pagination,
}

#[derive(Debug, Serialize)]
struct Pagination {
    limit: i64,
    offset: i64,
    #[serde(rename = "hasMore")]
    has_more: bool,
}

fn feed_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_FEED_LIMIT).clamp(1, MAX_FEED_LIMIT)
}

/// Newest-first article feed with optional cast, source and date filters.
pub(super) async fn list_feed(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedResponse>, ApiError> {
    let limit = feed_limit(query.limit);
    let offset = query.offset.unwrap_or(0).max(0);

    let filter = ArticleFilter {
        cast: query.cast.as_deref().filter(|c| !c.is_empty()),
        source: query.source.as_deref().filter(|s| !s.is_empty()),
        from: query.from,
        to: query.to,
        limit,
        offset,
    };

    let (rows, total) = nasol_db::list_articles(&state.pool, &filter)
        .await
        .map_err(|e| map_db_error(&req_id.0, &e))?;

    let returned = i64::try_from(rows.len()).unwrap_or(i64::MAX);
    let data: Vec<Article> = rows.into_iter().map(Article::from).collect();

    Ok(Json(FeedResponse {
        success: true,
        data,
        total,
        pagination: Pagination {
            limit,
            offset,
            has_more: offset + returned < total,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::build_app;
    use crate::api::tests::{test_config, test_program};
    use crate::middleware::FunctionAuth;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::Duration;
    use nasol_db::NewArticle;
    use nasol_ingest::PgArticleStore;
    use std::sync::Arc;
    use tower::ServiceExt;

    #[test]
    fn feed_limit_defaults_and_clamps() {
        assert_eq!(feed_limit(None), 20);
        assert_eq!(feed_limit(Some(0)), 1);
        assert_eq!(feed_limit(Some(500)), 100);
        assert_eq!(feed_limit(Some(35)), 35);
    }

    fn seed(url: &str, source: &str, cast: &[&str], hours_ago: i64) -> NewArticle {
        NewArticle {
            title: format!("나는솔로 {url}"),
            article_url: url.to_string(),
            source: source.to_string(),
            summary: None,
            published_at: Utc::now() - Duration::hours(hours_ago),
            thumbnail_url: None,
            keywords: vec!["나는솔로".to_string()],
            cast_members: cast.iter().map(ToString::to_string).collect(),
            status: "collected".to_string(),
            hash: None,
            content_hash: None,
            embedding: None,
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn feed_filters_by_cast_and_paginates(pool: sqlx::PgPool) {
        nasol_db::upsert_articles(
            &pool,
            &[
                seed("https://www.news.com/1", "news", &["영수"], 1),
                seed("https://www.news.com/2", "news", &["영수", "옥순"], 2),
                seed("https://www.star.com/3", "star", &["옥순"], 3),
            ],
        )
        .await
        .expect("seed articles");

        let state = AppState {
            pool: pool.clone(),
            config: Arc::new(test_config()),
            program: Arc::new(test_program()),
            store: Arc::new(PgArticleStore::new(pool)),
        };

        let response = build_app(state, FunctionAuth::disabled())
            .oneshot(
                Request::builder()
                    .uri("/api/feed?cast=%EC%98%81%EC%88%98&limit=1")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");

        assert_eq!(json["success"], true);
        assert_eq!(json["total"], 2);
        assert_eq!(json["pagination"]["limit"], 1);
        assert_eq!(json["pagination"]["offset"], 0);
        assert_eq!(json["pagination"]["hasMore"], true);
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["article_url"], "https://www.news.com/1");
    }
}
