use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use nasol_core::{Comment, NewComment, NewPost, Post, PostDetail};
use nasol_db::DbError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::middleware::RequestId;

use super::{ApiError, AppState};

const DEFAULT_POST_LIMIT: i64 = 20;
const MAX_POST_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub(super) struct PostListQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct Envelope<T: Serialize> {
    success: bool,
    data: T,
}

impl<T: Serialize> Envelope<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

fn post_limit(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_POST_LIMIT)
        .clamp(1, MAX_POST_LIMIT)
}

fn post_offset(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(0)
        .max(0)
}

/// Parses a request body as a JSON object. Anything else reads as empty.
fn json_object(body: &Bytes) -> Value {
    serde_json::from_slice::<Value>(body)
        .ok()
        .filter(Value::is_object)
        .unwrap_or(Value::Null)
}

/// Text of a string, number or boolean field; empty otherwise.
fn text_field(body: &Value, key: &str) -> String {
    match body.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
        _ => String::new(),
    }
}

fn id_field(body: &Value, key: &str) -> Option<i64> {
    match body.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn optional_text(body: &Value, key: &str) -> Option<String> {
    Some(text_field(body, key)).filter(|s| !s.is_empty())
}

fn storage_error(req_id: &RequestId, error: &DbError, message: &str) -> ApiError {
    tracing::error!(request_id = %req_id.0, error = %error, "community query failed");
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, message)
}

fn post_not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "게시글을 찾을 수 없습니다")
}

/// Newest posts first; `limit` defaults to 20 and is capped at 50.
pub(super) async fn list_posts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PostListQuery>,
) -> Result<Json<Envelope<Vec<Post>>>, ApiError> {
    let limit = post_limit(query.limit.as_deref());
    let offset = post_offset(query.offset.as_deref());

    let rows = nasol_db::list_posts(&state.pool, limit, offset)
        .await
        .map_err(|e| storage_error(&req_id, &e, "목록 조회 실패"))?;

    Ok(Envelope::ok(rows.into_iter().map(Post::from).collect()))
}

pub(super) async fn create_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<Envelope<Post>>, ApiError> {
    let body = json_object(&body);
    let nickname = optional_text(&body, "nickname");
    let draft = NewPost::parse(
        &text_field(&body, "title"),
        &text_field(&body, "content"),
        nickname.as_deref(),
    )
    .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?;

    let row = nasol_db::insert_post(&state.pool, &draft)
        .await
        .map_err(|e| storage_error(&req_id, &e, "작성 실패"))?;

    tracing::info!(post_id = row.id, "community post created");
    Ok(Envelope::ok(Post::from(row)))
}

/// One post with its comments, newest comment first.
pub(super) async fn get_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<PostDetail>>, ApiError> {
    let id: i64 = id.trim().parse().map_err(|_| post_not_found())?;

    let post = match nasol_db::get_post(&state.pool, id).await {
        Ok(row) => Post::from(row),
        Err(DbError::NotFound) => return Err(post_not_found()),
        Err(e) => return Err(storage_error(&req_id, &e, "상세 조회 실패")),
    };
    let comments = nasol_db::list_comments(&state.pool, id)
        .await
        .map_err(|e| storage_error(&req_id, &e, "상세 조회 실패"))?;

    Ok(Envelope::ok(PostDetail {
        post,
        comments: comments.into_iter().map(Comment::from).collect(),
    }))
}

pub(super) async fn create_comment(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<Envelope<Comment>>, ApiError> {
    let body = json_object(&body);
    let nickname = optional_text(&body, "nickname");
    let draft = NewComment::parse(
        id_field(&body, "post_id"),
        &text_field(&body, "content"),
        nickname.as_deref(),
    )
    .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?;

    match nasol_db::insert_comment(&state.pool, &draft).await {
        Ok(row) => Ok(Envelope::ok(Comment::from(row))),
        Err(DbError::NotFound) => Err(post_not_found()),
        Err(e) => Err(storage_error(&req_id, &e, "댓글 작성 실패")),
    }
}
