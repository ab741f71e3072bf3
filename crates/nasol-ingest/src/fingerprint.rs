//! Pluggable duplicate detection.
//!
//! A [`Fingerprinter`] derives a [`Fingerprint`] from a candidate and decides
//! whether that fingerprint matches an article already in the window. The
//! URL-hash and content-hash variants compare strings; the embedding variant
//! compares vectors by cosine similarity.

use async_trait::async_trait;
use nasol_core::{AppConfig, DedupStrategy};
use sha2::{Digest, Sha256};

use crate::clean::{normalize_text, truncate_chars};
use crate::embeddings::EmbeddingClient;
use crate::error::IngestError;
use crate::similarity::cosine_similarity;
use crate::types::{CandidateArticle, RecentArticle};

#[derive(Debug, Clone, PartialEq)]
pub enum Fingerprint {
    UrlHash(String),
    ContentHash(String),
    Embedding(Vec<f32>),
}

#[async_trait]
pub trait Fingerprinter: Send + Sync {
    /// Computes the fingerprint, or `None` when it cannot be obtained. A
    /// candidate without a fingerprint is never treated as a duplicate.
    async fn fingerprint(&self, candidate: &CandidateArticle) -> Option<Fingerprint>;

    /// Whether `fingerprint` marks `recent` as the same story.
    fn matches(&self, fingerprint: &Fingerprint, recent: &RecentArticle) -> bool;
}

/// SHA-256 hex digest of the article URL.
#[must_use]
pub fn url_hash(url: &str) -> String {
    sha256_hex(url)
}

/// SHA-256 hex digest of normalized `title + " " + summary`.
#[must_use]
pub fn content_hash(title: &str, summary: &str) -> String {
    sha256_hex(&normalize_text(&format!("{title} {summary}")))
}

fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Exact match on the URL digest.
pub struct UrlHashFingerprinter;

#[async_trait]
impl Fingerprinter for UrlHashFingerprinter {
    async fn fingerprint(&self, candidate: &CandidateArticle) -> Option<Fingerprint> {
        Some(Fingerprint::UrlHash(candidate.hash.clone()))
    }

    fn matches(&self, fingerprint: &Fingerprint, recent: &RecentArticle) -> bool {
        matches!(
            (fingerprint, recent.hash.as_deref()),
            (Fingerprint::UrlHash(h), Some(r)) if h == r
        )
    }
}

/// Exact match on the normalized-text digest. Catches verbatim reposts only.
pub struct ContentHashFingerprinter;

#[async_trait]
impl Fingerprinter for ContentHashFingerprinter {
    async fn fingerprint(&self, candidate: &CandidateArticle) -> Option<Fingerprint> {
        Some(Fingerprint::ContentHash(candidate.content_hash.clone()))
    }

    fn matches(&self, fingerprint: &Fingerprint, recent: &RecentArticle) -> bool {
        matches!(
            (fingerprint, recent.content_hash.as_deref()),
            (Fingerprint::ContentHash(h), Some(r)) if h == r
        )
    }
}

/// Semantic match: cosine similarity at or above `threshold`.
pub struct EmbeddingFingerprinter {
    client: EmbeddingClient,
    threshold: f32,
    max_input_chars: usize,
}

impl EmbeddingFingerprinter {
    #[must_use]
    pub fn new(client: EmbeddingClient, threshold: f32, max_input_chars: usize) -> Self {
        Self {
            client,
            threshold,
            max_input_chars,
        }
    }
}

#[async_trait]
impl Fingerprinter for EmbeddingFingerprinter {
    async fn fingerprint(&self, candidate: &CandidateArticle) -> Option<Fingerprint> {
        let text = truncate_chars(
            &format!("{} {}", candidate.title, candidate.summary),
            self.max_input_chars,
        );
        self.client.embed(&text).await.map(Fingerprint::Embedding)
    }

    fn matches(&self, fingerprint: &Fingerprint, recent: &RecentArticle) -> bool {
        match (fingerprint, recent.embedding.as_deref()) {
            (Fingerprint::Embedding(v), Some(r)) => cosine_similarity(v, r) >= self.threshold,
            _ => false,
        }
    }
}

/// Builds the fingerprinter for the run's effective strategy.
///
/// # Errors
///
/// Returns [`IngestError::Http`] if the embedding client cannot be built.
pub fn build_fingerprinter(config: &AppConfig) -> Result<Box<dyn Fingerprinter>, IngestError> {
    let strategy = config.effective_dedup_strategy();
    if strategy != config.dedup.strategy {
        tracing::info!(
            configured = %config.dedup.strategy,
            effective = %strategy,
            "no embedding token configured; semantic dedup disabled"
        );
    }

    let fingerprinter: Box<dyn Fingerprinter> = match (strategy, config.hf_api_token.as_deref()) {
        (DedupStrategy::Embedding, Some(token)) => {
            let client = EmbeddingClient::new(
                &config.embedding_base_url,
                token,
                &config.dedup.embedding_models,
                config.dedup.embedding_dim,
                config.embedding_timeout_secs,
            )?;
            Box::new(EmbeddingFingerprinter::new(
                client,
                config.dedup.similarity_threshold,
                config.dedup.max_input_chars,
            ))
        }
        (DedupStrategy::UrlHash, _) => Box::new(UrlHashFingerprinter),
        _ => Box::new(ContentHashFingerprinter),
    };
    Ok(fingerprinter)
}
