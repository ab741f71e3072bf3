//! Storage contract shared by the collection pipeline and the enricher.

#[cfg(any(test, feature = "test-support"))]
mod memory;
mod postgres;

#[cfg(any(test, feature = "test-support"))]
pub use memory::{MemoryStore, StoredArticle};
pub use postgres::PgArticleStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nasol_core::FunctionLog;
use nasol_db::NewArticle;

use crate::error::IngestError;
use crate::types::{RecentArticle, ThumbnailTarget};

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Dedup signals of articles published at or after `since`, newest
    /// first, at most `limit` rows.
    async fn recent_window(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RecentArticle>, IngestError>;

    /// Upserts keyed on `article_url`, all-or-nothing. Returns rows written.
    async fn upsert_articles(&self, articles: &[NewArticle]) -> Result<u64, IngestError>;

    async fn insert_function_log(&self, log: &FunctionLog) -> Result<(), IngestError>;

    /// Articles with no thumbnail and no recorded outcome, newest first.
    async fn missing_thumbnails(&self, limit: i64) -> Result<Vec<ThumbnailTarget>, IngestError>;

    async fn mark_thumbnail_success(&self, id: i64, thumbnail_url: &str)
        -> Result<u64, IngestError>;

    async fn mark_thumbnails_failed(&self, ids: &[i64]) -> Result<u64, IngestError>;
}
