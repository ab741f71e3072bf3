use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nasol_core::{FunctionLog, ThumbnailStatus};
use nasol_db::NewArticle;

use super::ArticleStore;
use crate::error::IngestError;
use crate::types::{RecentArticle, ThumbnailTarget};

/// One row held by [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct StoredArticle {
    pub id: i64,
    pub article: NewArticle,
    pub thumbnail_status: Option<String>,
}

#[derive(Default)]
struct Inner {
    articles: Vec<StoredArticle>,
    logs: Vec<FunctionLog>,
    next_id: i64,
}

/// In-process [`ArticleStore`] with the same upsert and selection rules as
/// the Postgres tables. Failure switches let callers exercise the
/// storage-error paths.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_selects: AtomicBool,
    fail_upsert: AtomicBool,
    fail_logs: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent window or thumbnail select fail.
    pub fn fail_selects(&self, fail: bool) {
        self.fail_selects.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent upsert fail without writing.
    pub fn fail_upsert(&self, fail: bool) {
        self.fail_upsert.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent function-log insert fail.
    pub fn fail_logs(&self, fail: bool) {
        self.fail_logs.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of stored articles in insertion order.
    #[must_use]
    pub fn articles(&self) -> Vec<StoredArticle> {
        self.lock().map(|g| g.articles.clone()).unwrap_or_default()
    }

    /// Snapshot of appended function logs.
    #[must_use]
    pub fn logs(&self) -> Vec<FunctionLog> {
        self.lock().map(|g| g.logs.clone()).unwrap_or_default()
    }

    /// Looks a stored article up by URL.
    #[must_use]
    pub fn get(&self, article_url: &str) -> Option<StoredArticle> {
        self.lock().ok().and_then(|g| {
            g.articles
                .iter()
                .find(|a| a.article.article_url == article_url)
                .cloned()
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, IngestError> {
        self.inner
            .lock()
            .map_err(|_| IngestError::Storage("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn recent_window(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RecentArticle>, IngestError> {
        if self.fail_selects.load(Ordering::SeqCst) {
            return Err(IngestError::Storage("window select failed".to_string()));
        }
        let guard = self.lock()?;
        let mut rows: Vec<&StoredArticle> = guard
            .articles
            .iter()
            .filter(|a| a.article.published_at >= since)
            .collect();
        rows.sort_by(|a, b| {
            b.article
                .published_at
                .cmp(&a.article.published_at)
                .then(b.id.cmp(&a.id))
        });
        Ok(rows
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|a| RecentArticle {
                article_url: a.article.article_url.clone(),
                hash: a.article.hash.clone(),
                content_hash: a.article.content_hash.clone(),
                embedding: a.article.embedding.clone(),
            })
            .collect())
    }

    async fn upsert_articles(&self, articles: &[NewArticle]) -> Result<u64, IngestError> {
        if self.fail_upsert.load(Ordering::SeqCst) {
            return Err(IngestError::Storage("upsert failed".to_string()));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = articles
            .iter()
            .find(|a| !seen.insert(a.article_url.as_str()))
        {
            return Err(IngestError::Storage(format!(
                "batch touches {} more than once",
                dup.article_url
            )));
        }

        let mut guard = self.lock()?;
        let inner = &mut *guard;
        for incoming in articles {
            if let Some(existing) = inner
                .articles
                .iter_mut()
                .find(|a| a.article.article_url == incoming.article_url)
            {
                let thumbnail_url = incoming
                    .thumbnail_url
                    .clone()
                    .or_else(|| existing.article.thumbnail_url.take());
                let embedding = incoming
                    .embedding
                    .clone()
                    .or_else(|| existing.article.embedding.take());
                existing.article = NewArticle {
                    thumbnail_url,
                    embedding,
                    ..incoming.clone()
                };
            } else {
                inner.next_id += 1;
                let id = inner.next_id;
                inner.articles.push(StoredArticle {
                    id,
                    article: incoming.clone(),
                    thumbnail_status: None,
                });
            }
        }
        Ok(articles.len() as u64)
    }

    async fn insert_function_log(&self, log: &FunctionLog) -> Result<(), IngestError> {
        if self.fail_logs.load(Ordering::SeqCst) {
            return Err(IngestError::Storage("log insert failed".to_string()));
        }
        self.lock()?.logs.push(log.clone());
        Ok(())
    }

    async fn missing_thumbnails(&self, limit: i64) -> Result<Vec<ThumbnailTarget>, IngestError> {
        if self.fail_selects.load(Ordering::SeqCst) {
            return Err(IngestError::Storage("thumbnail select failed".to_string()));
        }
        let guard = self.lock()?;
        let mut rows: Vec<&StoredArticle> = guard
            .articles
            .iter()
            .filter(|a| {
                a.article.thumbnail_url.is_none()
                    && a.thumbnail_status.as_deref().is_none_or(str::is_empty)
            })
            .collect();
        rows.sort_by(|a, b| {
            b.article
                .published_at
                .cmp(&a.article.published_at)
                .then(b.id.cmp(&a.id))
        });
        Ok(rows
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|a| ThumbnailTarget {
                id: a.id,
                article_url: a.article.article_url.clone(),
            })
            .collect())
    }

    async fn mark_thumbnail_success(
        &self,
        id: i64,
        thumbnail_url: &str,
    ) -> Result<u64, IngestError> {
        let mut guard = self.lock()?;
        let Some(row) = guard.articles.iter_mut().find(|a| a.id == id) else {
            return Ok(0);
        };
        row.article.thumbnail_url = Some(thumbnail_url.to_string());
        row.thumbnail_status = Some(ThumbnailStatus::Success.as_str().to_string());
        Ok(1)
    }

    async fn mark_thumbnails_failed(&self, ids: &[i64]) -> Result<u64, IngestError> {
        let mut guard = self.lock()?;
        let mut updated = 0;
        for row in guard.articles.iter_mut().filter(|a| ids.contains(&a.id)) {
            row.thumbnail_status = Some(ThumbnailStatus::Failed.as_str().to_string());
            updated += 1;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(url: &str, title: &str) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            article_url: url.to_string(),
            source: "news".to_string(),
            summary: None,
            published_at: Utc::now(),
            thumbnail_url: None,
            keywords: vec![],
            cast_members: vec![],
            status: "collected".to_string(),
            hash: None,
            content_hash: None,
            embedding: None,
        }
    }

    #[tokio::test]
    async fn upsert_overwrites_by_url_and_keeps_thumbnail() {
        let store = MemoryStore::new();
        store
            .upsert_articles(&[article("https://a/1", "old")])
            .await
            .unwrap();
        let id = store.get("https://a/1").unwrap().id;
        store.mark_thumbnail_success(id, "https://img/1").await.unwrap();

        store
            .upsert_articles(&[article("https://a/1", "new")])
            .await
            .unwrap();

        let rows = store.articles();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].article.title, "new");
        assert_eq!(rows[0].article.thumbnail_url.as_deref(), Some("https://img/1"));
    }

    #[tokio::test]
    async fn upsert_rejects_repeated_url_in_one_batch() {
        let store = MemoryStore::new();
        let result = store
            .upsert_articles(&[article("https://a/1", "x"), article("https://a/1", "y")])
            .await;
        assert!(matches!(result, Err(IngestError::Storage(_))));
        assert!(store.articles().is_empty());
    }

    #[tokio::test]
    async fn failed_and_successful_rows_leave_the_selection() {
        let store = MemoryStore::new();
        store
            .upsert_articles(&[
                article("https://a/1", "1"),
                article("https://a/2", "2"),
                article("https://a/3", "3"),
            ])
            .await
            .unwrap();
        let one = store.get("https://a/1").unwrap().id;
        let two = store.get("https://a/2").unwrap().id;
        store.mark_thumbnail_success(one, "https://img").await.unwrap();
        assert_eq!(store.mark_thumbnails_failed(&[two, 999]).await.unwrap(), 1);

        let targets = store.missing_thumbnails(20).await.unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].article_url, "https://a/3");
    }
}
