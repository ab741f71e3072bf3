//! Database operations for the `articles` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A full row from the `articles` table, minus the embedding vector.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleRow {
    pub id: i64,
    pub title: String,
    pub article_url: String,
    pub source: String,
    pub summary: Option<String>,
    pub published_at: DateTime<Utc>,
    pub thumbnail_url: Option<String>,
    pub thumbnail_status: Option<String>,
    pub keywords: Vec<String>,
    pub cast_members: Vec<String>,
    pub status: String,
    pub hash: Option<String>,
    pub content_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ArticleRow> for nasol_core::Article {
    fn from(row: ArticleRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            article_url: row.article_url,
            source: row.source,
            summary: row.summary,
            published_at: row.published_at,
            thumbnail_url: row.thumbnail_url,
            thumbnail_status: row.thumbnail_status,
            keywords: row.keywords,
            cast_members: row.cast_members,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Dedup signals of a recently published article.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecentFingerprintRow {
    pub id: i64,
    pub article_url: String,
    pub published_at: DateTime<Utc>,
    pub hash: Option<String>,
    pub content_hash: Option<String>,
    pub embedding: Option<Vec<f32>>,
}

/// An article still waiting for a thumbnail.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ThumbnailTargetRow {
    pub id: i64,
    pub article_url: String,
}

/// Insert payload for [`upsert_articles`].
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub article_url: String,
    pub source: String,
    pub summary: Option<String>,
    pub published_at: DateTime<Utc>,
    pub thumbnail_url: Option<String>,
    pub keywords: Vec<String>,
    pub cast_members: Vec<String>,
    pub status: String,
    pub hash: Option<String>,
    pub content_hash: Option<String>,
    pub embedding: Option<Vec<f32>>,
}

/// Filters for the public feed listing.
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter<'a> {
    pub cast: Option<&'a str>,
    pub source: Option<&'a str>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

const ARTICLE_COLUMNS: &str = "id, title, article_url, source, summary, published_at, \
     thumbnail_url, thumbnail_status, keywords, cast_members, status, hash, content_hash, \
     created_at, updated_at";

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Upserts a batch of articles keyed on `article_url`, all-or-nothing.
///
/// Conflicting URLs take the incoming collected fields. An existing
/// thumbnail and embedding are kept when the incoming row has none, so a
/// re-collected article does not lose its enrichment.
///
/// Returns the number of rows written. Callers must dedupe the batch by URL
/// first; Postgres rejects a statement that touches the same row twice.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails; the transaction is rolled
/// back and nothing is written.
pub async fn upsert_articles(pool: &PgPool, articles: &[NewArticle]) -> Result<u64, DbError> {
    if articles.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut written: u64 = 0;

    for article in articles {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO articles \
                 (title, article_url, source, summary, published_at, thumbnail_url, \
                  keywords, cast_members, status, hash, content_hash, embedding) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             ON CONFLICT (article_url) DO UPDATE SET \
                 title         = EXCLUDED.title, \
                 source        = EXCLUDED.source, \
                 summary       = EXCLUDED.summary, \
                 published_at  = EXCLUDED.published_at, \
                 thumbnail_url = COALESCE(EXCLUDED.thumbnail_url, articles.thumbnail_url), \
                 keywords      = EXCLUDED.keywords, \
                 cast_members  = EXCLUDED.cast_members, \
                 status        = EXCLUDED.status, \
                 hash          = EXCLUDED.hash, \
                 content_hash  = EXCLUDED.content_hash, \
                 embedding     = COALESCE(EXCLUDED.embedding, articles.embedding), \
                 updated_at    = NOW() \
             RETURNING id",
        )
        .bind(&article.title)
        .bind(&article.article_url)
        .bind(&article.source)
        .bind(&article.summary)
        .bind(article.published_at)
        .bind(&article.thumbnail_url)
        .bind(&article.keywords)
        .bind(&article.cast_members)
        .bind(&article.status)
        .bind(&article.hash)
        .bind(&article.content_hash)
        .bind(&article.embedding)
        .fetch_one(&mut *tx)
        .await?;
        written += 1;
    }

    tx.commit().await?;
    Ok(written)
}

/// Records a resolved thumbnail for one article.
///
/// Returns the number of rows updated (0 if the id no longer exists).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_thumbnail_success(
    pool: &PgPool,
    id: i64,
    thumbnail_url: &str,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE articles \
         SET thumbnail_url = $1, thumbnail_status = 'success', updated_at = NOW() \
         WHERE id = $2",
    )
    .bind(thumbnail_url)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Marks a set of articles as having no retrievable thumbnail so they are
/// not selected again.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_thumbnails_failed(pool: &PgPool, ids: &[i64]) -> Result<u64, DbError> {
    if ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        "UPDATE articles \
         SET thumbnail_status = 'failed', updated_at = NOW() \
         WHERE id = ANY($1)",
    )
    .bind(ids)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns the dedup signals of articles published at or after `since`,
/// newest first, capped at `limit`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_fingerprints(
    pool: &PgPool,
    since: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<RecentFingerprintRow>, DbError> {
    let rows = sqlx::query_as::<_, RecentFingerprintRow>(
        "SELECT id, article_url, published_at, hash, content_hash, embedding \
         FROM articles \
         WHERE published_at >= $1 \
         ORDER BY published_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(since)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns up to `limit` articles with no thumbnail and no prior outcome,
/// most recently published first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_articles_missing_thumbnail(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<ThumbnailTargetRow>, DbError> {
    let rows = sqlx::query_as::<_, ThumbnailTargetRow>(
        "SELECT id, article_url \
         FROM articles \
         WHERE thumbnail_url IS NULL \
           AND (thumbnail_status IS NULL OR thumbnail_status = '') \
         ORDER BY published_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches a single article by its canonical URL.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matches, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn get_article_by_url(pool: &PgPool, article_url: &str) -> Result<ArticleRow, DbError> {
    let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE article_url = $1");
    sqlx::query_as::<_, ArticleRow>(&sql)
        .bind(article_url)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Lists feed articles newest first, returning the page and the total
/// number of rows matching the filters.
///
/// `cast` matches membership in `cast_members`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn list_articles(
    pool: &PgPool,
    filter: &ArticleFilter<'_>,
) -> Result<(Vec<ArticleRow>, i64), DbError> {
    const WHERE_CLAUSE: &str = "WHERE ($1::TEXT IS NULL OR $1 = ANY(cast_members)) \
           AND ($2::TEXT IS NULL OR source = $2) \
           AND ($3::timestamptz IS NULL OR published_at >= $3) \
           AND ($4::timestamptz IS NULL OR published_at <= $4)";

    let sql = format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles {WHERE_CLAUSE} \
         ORDER BY published_at DESC, id DESC \
         LIMIT $5 OFFSET $6"
    );
    let rows = sqlx::query_as::<_, ArticleRow>(&sql)
        .bind(filter.cast)
        .bind(filter.source)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await?;

    let count_sql = format!("SELECT COUNT(*) FROM articles {WHERE_CLAUSE}");
    let total = sqlx::query_scalar::<_, i64>(&count_sql)
        .bind(filter.cast)
        .bind(filter.source)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(pool)
        .await?;

    Ok((rows, total))
}
