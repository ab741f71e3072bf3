//! News ingestion for the 나는솔로 feed.
//!
//! Collects articles from the news-search API, drops off-topic results and
//! near-duplicates of recently stored stories, upserts the survivors, and
//! back-fills thumbnails from each article's social-preview metadata.

pub mod cast;
pub mod clean;
pub mod collector;
pub mod embeddings;
pub mod enrich;
pub mod error;
pub mod fingerprint;
pub mod pipeline;
pub mod relevance;
pub mod search;
pub mod similarity;
pub mod store;
pub mod thumbnail;
pub mod trigger;
pub mod types;

pub use enrich::{
    enrich_thumbnails, normalize_limit, run_thumbnail_enrichment, DEFAULT_ENRICH_LIMIT,
    ENRICH_FUNCTION_NAME,
};
pub use error::IngestError;
pub use fingerprint::{Fingerprint, Fingerprinter};
pub use pipeline::{collect_news, run_news_collection, CollectionRun, COLLECT_FUNCTION_NAME};
#[cfg(any(test, feature = "test-support"))]
pub use store::MemoryStore;
pub use store::{ArticleStore, PgArticleStore};
pub use thumbnail::ThumbnailFetcher;
pub use trigger::ThumbnailTrigger;
pub use types::{CandidateArticle, CollectionReport, EnrichReport, RecentArticle, ThumbnailTarget};
