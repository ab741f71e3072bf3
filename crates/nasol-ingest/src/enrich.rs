//! Thumbnail back-fill batch job.

use std::time::Instant;

use futures::future::join_all;
use nasol_core::{AppConfig, FunctionLog};

use crate::error::IngestError;
use crate::store::ArticleStore;
use crate::thumbnail::ThumbnailFetcher;
use crate::types::EnrichReport;

pub const ENRICH_FUNCTION_NAME: &str = "enrich-thumbnails";

pub const DEFAULT_ENRICH_LIMIT: i64 = 20;
const MAX_ENRICH_LIMIT: i64 = 100;

/// Concurrent page fetches per chunk.
const FETCH_CHUNK: usize = 5;
/// Concurrent success updates per chunk.
const SUCCESS_CHUNK: usize = 5;
/// Failed ids per batched update.
const FAILURE_CHUNK: usize = 10;

/// Accepts a requested limit in `1..=100`; anything else becomes the default.
#[must_use]
pub fn normalize_limit(requested: Option<i64>) -> i64 {
    match requested {
        Some(n) if (1..=MAX_ENRICH_LIMIT).contains(&n) => n,
        _ => DEFAULT_ENRICH_LIMIT,
    }
}

/// Selects articles lacking a thumbnail, fetches their pages in chunks of
/// [`FETCH_CHUNK`], and records each outcome.
///
/// Update errors are logged and count as zero rows; they do not abort the
/// batch.
///
/// # Errors
///
/// Returns [`IngestError::Storage`] if the selection query fails. Nothing is
/// written in that case.
pub async fn enrich_thumbnails(
    store: &dyn ArticleStore,
    fetcher: &ThumbnailFetcher,
    limit: i64,
) -> Result<EnrichReport, IngestError> {
    let targets = store.missing_thumbnails(limit).await?;
    if targets.is_empty() {
        return Ok(EnrichReport::default());
    }

    let mut found: Vec<(i64, String)> = Vec::new();
    let mut missing: Vec<i64> = Vec::new();

    for chunk in targets.chunks(FETCH_CHUNK) {
        let results = join_all(chunk.iter().map(|t| fetcher.fetch(&t.article_url))).await;
        for (target, thumbnail) in chunk.iter().zip(results) {
            match thumbnail {
                Some(url) => found.push((target.id, url)),
                None => missing.push(target.id),
            }
        }
    }

    let mut updated: u64 = 0;
    for chunk in found.chunks(SUCCESS_CHUNK) {
        let results = join_all(
            chunk
                .iter()
                .map(|(id, url)| store.mark_thumbnail_success(*id, url)),
        )
        .await;
        for ((id, _), result) in chunk.iter().zip(results) {
            match result {
                Ok(n) => updated += n,
                Err(e) => tracing::warn!(article_id = id, error = %e, "thumbnail update failed"),
            }
        }
    }

    let mut failed: u64 = 0;
    for chunk in missing.chunks(FAILURE_CHUNK) {
        match store.mark_thumbnails_failed(chunk).await {
            Ok(n) => failed += n,
            Err(e) => tracing::warn!(ids = ?chunk, error = %e, "thumbnail failure update failed"),
        }
    }

    Ok(EnrichReport {
        scanned: targets.len(),
        updated,
        failed,
    })
}

/// Runs one enrichment batch and appends its function log.
///
/// Returns the batch outcome together with the elapsed milliseconds, which
/// callers report whether or not the batch succeeded.
pub async fn run_thumbnail_enrichment(
    config: &AppConfig,
    store: &dyn ArticleStore,
    limit: i64,
) -> (Result<EnrichReport, IngestError>, i64) {
    let started = Instant::now();

    let result = match ThumbnailFetcher::new(config.thumbnail_timeout_secs) {
        Ok(fetcher) => enrich_thumbnails(store, &fetcher, limit).await,
        Err(e) => Err(e),
    };
    let elapsed_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);

    let log = match &result {
        Ok(report) => {
            tracing::info!(
                limit,
                scanned = report.scanned,
                updated = report.updated,
                failed = report.failed,
                elapsed_ms,
                "thumbnail enrichment complete"
            );
            FunctionLog::success(ENRICH_FUNCTION_NAME, elapsed_ms)
        }
        Err(e) => {
            tracing::error!(limit, error = %e, elapsed_ms, "thumbnail enrichment failed");
            FunctionLog::error(ENRICH_FUNCTION_NAME, elapsed_ms, e.to_string())
        }
    };
    if let Err(e) = store.insert_function_log(&log).await {
        tracing::warn!(error = %e, "failed to record enrichment function log");
    }

    (result, elapsed_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_limit_accepts_range_and_defaults_otherwise() {
        assert_eq!(normalize_limit(Some(1)), 1);
        assert_eq!(normalize_limit(Some(100)), 100);
        assert_eq!(normalize_limit(Some(0)), 20);
        assert_eq!(normalize_limit(Some(101)), 20);
        assert_eq!(normalize_limit(Some(-5)), 20);
        assert_eq!(normalize_limit(None), 20);
    }
}
