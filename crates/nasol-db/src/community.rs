//! Queries for the community board (`posts` and `comments`).

use chrono::{DateTime, Utc};
use nasol_core::{Comment, NewComment, NewPost, Post};
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            nickname: row.nickname,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub content: String,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            content: row.content,
            nickname: row.nickname,
            created_at: row.created_at,
        }
    }
}

/// Lists posts newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_posts(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<PostRow>, DbError> {
    let rows = sqlx::query_as::<_, PostRow>(
        "SELECT id, title, content, nickname, created_at \
         FROM posts \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Inserts a validated post and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_post(pool: &PgPool, post: &NewPost) -> Result<PostRow, DbError> {
    let row = sqlx::query_as::<_, PostRow>(
        "INSERT INTO posts (title, content, nickname) \
         VALUES ($1, $2, $3) \
         RETURNING id, title, content, nickname, created_at",
    )
    .bind(&post.title)
    .bind(&post.content)
    .bind(&post.nickname)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no post has this `id`.
pub async fn get_post(pool: &PgPool, id: i64) -> Result<PostRow, DbError> {
    sqlx::query_as::<_, PostRow>(
        "SELECT id, title, content, nickname, created_at FROM posts WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Comments on one post, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_comments(pool: &PgPool, post_id: i64) -> Result<Vec<CommentRow>, DbError> {
    let rows = sqlx::query_as::<_, CommentRow>(
        "SELECT id, post_id, content, nickname, created_at \
         FROM comments \
         WHERE post_id = $1 \
         ORDER BY created_at DESC, id DESC",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Inserts a comment when its post exists.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the post does not exist, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn insert_comment(pool: &PgPool, comment: &NewComment) -> Result<CommentRow, DbError> {
    sqlx::query_as::<_, CommentRow>(
        "INSERT INTO comments (post_id, content, nickname) \
         SELECT p.id, $2, $3 FROM posts p WHERE p.id = $1 \
         RETURNING id, post_id, content, nickname, created_at",
    )
    .bind(comment.post_id)
    .bind(&comment.content)
    .bind(&comment.nickname)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}
