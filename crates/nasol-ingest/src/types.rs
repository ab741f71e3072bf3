use chrono::{DateTime, Utc};
use nasol_db::NewArticle;
use serde::Serialize;

/// A cleaned search result that passed the relevance filter.
#[derive(Debug, Clone)]
pub struct CandidateArticle {
    pub title: String,
    /// `originallink` from the search API, or `link` when that is empty.
    pub article_url: String,
    /// First DNS label of the URL host, `"unknown"` if the URL does not parse.
    pub source: String,
    /// Cleaned description, at most 150 characters.
    pub summary: String,
    pub published_at: DateTime<Utc>,
    /// The keyword whose search produced this candidate.
    pub keywords: Vec<String>,
    pub cast_members: Vec<String>,
    pub status: String,
    /// SHA-256 hex of `article_url`.
    pub hash: String,
    /// SHA-256 hex of normalized title + summary.
    pub content_hash: String,
    /// Set by the embedding fingerprinter when a vector was obtained.
    pub embedding: Option<Vec<f32>>,
}

impl CandidateArticle {
    /// The window entry this candidate contributes once accepted.
    #[must_use]
    pub fn to_recent(&self) -> RecentArticle {
        RecentArticle {
            article_url: self.article_url.clone(),
            hash: Some(self.hash.clone()),
            content_hash: Some(self.content_hash.clone()),
            embedding: self.embedding.clone(),
        }
    }
}

impl From<CandidateArticle> for NewArticle {
    fn from(c: CandidateArticle) -> Self {
        Self {
            title: c.title,
            article_url: c.article_url,
            source: c.source,
            summary: Some(c.summary),
            published_at: c.published_at,
            thumbnail_url: None,
            keywords: c.keywords,
            cast_members: c.cast_members,
            status: c.status,
            hash: Some(c.hash),
            content_hash: Some(c.content_hash),
            embedding: c.embedding,
        }
    }
}

/// Dedup signals of an article already in the comparison window.
#[derive(Debug, Clone, Default)]
pub struct RecentArticle {
    pub article_url: String,
    pub hash: Option<String>,
    pub content_hash: Option<String>,
    pub embedding: Option<Vec<f32>>,
}

impl From<nasol_db::RecentFingerprintRow> for RecentArticle {
    fn from(row: nasol_db::RecentFingerprintRow) -> Self {
        Self {
            article_url: row.article_url,
            hash: row.hash,
            content_hash: row.content_hash,
            embedding: row.embedding,
        }
    }
}

/// An article selected for thumbnail enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailTarget {
    pub id: i64,
    pub article_url: String,
}

impl From<nasol_db::ThumbnailTargetRow> for ThumbnailTarget {
    fn from(row: nasol_db::ThumbnailTargetRow) -> Self {
        Self {
            id: row.id,
            article_url: row.article_url,
        }
    }
}

/// Outcome of one collection run, serialized as the endpoint response.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    pub success: bool,
    /// Candidates that survived relevance and fingerprint dedup.
    pub collected: usize,
    /// Rows written by the upsert.
    pub saved: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CollectionReport {
    #[must_use]
    pub fn succeeded(collected: usize, saved: u64) -> Self {
        Self {
            success: true,
            collected,
            saved,
            message: Some(format!("news collection complete: {saved} saved")),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            collected: 0,
            saved: 0,
            message: Some("news collection failed".to_string()),
            error: Some(error),
        }
    }
}

/// Counts from one thumbnail enrichment batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichReport {
    pub scanned: usize,
    pub updated: u64,
    pub failed: u64,
}
