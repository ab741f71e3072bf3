use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nasol_core::FunctionLog;
use nasol_db::NewArticle;
use sqlx::PgPool;

use super::ArticleStore;
use crate::error::IngestError;
use crate::types::{RecentArticle, ThumbnailTarget};

/// [`ArticleStore`] backed by the Postgres `articles` and `function_logs` tables.
#[derive(Clone)]
pub struct PgArticleStore {
    pool: PgPool,
}

impl PgArticleStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleStore for PgArticleStore {
    async fn recent_window(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RecentArticle>, IngestError> {
        let rows = nasol_db::list_recent_fingerprints(&self.pool, since, limit).await?;
        Ok(rows.into_iter().map(RecentArticle::from).collect())
    }

    async fn upsert_articles(&self, articles: &[NewArticle]) -> Result<u64, IngestError> {
        Ok(nasol_db::upsert_articles(&self.pool, articles).await?)
    }

    async fn insert_function_log(&self, log: &FunctionLog) -> Result<(), IngestError> {
        nasol_db::insert_function_log(&self.pool, log).await?;
        Ok(())
    }

    async fn missing_thumbnails(&self, limit: i64) -> Result<Vec<ThumbnailTarget>, IngestError> {
        let rows = nasol_db::list_articles_missing_thumbnail(&self.pool, limit).await?;
        Ok(rows.into_iter().map(ThumbnailTarget::from).collect())
    }

    async fn mark_thumbnail_success(
        &self,
        id: i64,
        thumbnail_url: &str,
    ) -> Result<u64, IngestError> {
        Ok(nasol_db::mark_thumbnail_success(&self.pool, id, thumbnail_url).await?)
    }

    async fn mark_thumbnails_failed(&self, ids: &[i64]) -> Result<u64, IngestError> {
        Ok(nasol_db::mark_thumbnails_failed(&self.pool, ids).await?)
    }
}
