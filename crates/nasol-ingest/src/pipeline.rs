//! News collection run: search, filter, dedup, persist, trigger enrichment.

use std::collections::HashSet;
use std::time::Instant;

use chrono::{Duration, Utc};
use nasol_core::{AppConfig, FunctionLog, ProgramProfile};
use nasol_db::NewArticle;
use tokio::task::JoinHandle;

use crate::collector::Collector;
use crate::error::IngestError;
use crate::fingerprint::{build_fingerprinter, Fingerprint, Fingerprinter};
use crate::search::SearchClient;
use crate::store::ArticleStore;
use crate::trigger::ThumbnailTrigger;
use crate::types::{CandidateArticle, CollectionReport, RecentArticle};

pub const COLLECT_FUNCTION_NAME: &str = "scheduled-news-fetch";

const SEARCH_TIMEOUT_SECS: u64 = 30;
const TRIGGER_TIMEOUT_SECS: u64 = 30;

/// Outcome of [`collect_news`]: the report plus the spawned enrichment
/// trigger, if the run got far enough to start one.
#[derive(Debug)]
pub struct CollectionRun {
    pub report: CollectionReport,
    pub trigger: Option<JoinHandle<()>>,
}

impl CollectionRun {
    /// Waits up to `wait` for the enrichment trigger to finish, then returns
    /// the report. A trigger still running at the deadline is aborted.
    pub async fn wait_for_trigger(self, wait: std::time::Duration) -> CollectionReport {
        let Some(mut handle) = self.trigger else {
            return self.report;
        };
        match tokio::time::timeout(wait, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "thumbnail trigger task failed"),
            Err(_) => {
                handle.abort();
                tracing::warn!(
                    wait_ms = wait.as_millis(),
                    "thumbnail trigger did not finish in time, abandoning"
                );
            }
        }
        self.report
    }
}

/// Run one collection pass and record exactly one function log for it.
///
/// The thumbnail trigger keeps running in the background; use
/// [`collect_news`] to get hold of it.
pub async fn run_news_collection(
    config: &AppConfig,
    program: &ProgramProfile,
    store: &dyn ArticleStore,
) -> CollectionReport {
    collect_news(config, program, store).await.report
}

/// Run one collection pass and record exactly one function log for it.
///
/// 1. Load the dedup window (articles from the last `window_hours`).
/// 2. For each keyword in order, search, clean and relevance-filter results.
/// 3. Drop candidates whose fingerprint matches the window; accepted
///    candidates join the window for the rest of the run.
/// 4. Drop repeated URLs (first occurrence wins) and upsert the rest.
/// 5. Spawn the thumbnail trigger without waiting for it.
///
/// A failing keyword or embedding call is logged and skipped. A storage or
/// configuration failure fails the whole run; the returned report then
/// carries the error message and zero counts.
pub async fn collect_news(
    config: &AppConfig,
    program: &ProgramProfile,
    store: &dyn ArticleStore,
) -> CollectionRun {
    let started = Instant::now();
    let result = collect_and_persist(config, program, store).await;
    let elapsed_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);

    let (report, log, trigger) = match result {
        Ok((collected, saved, trigger)) => {
            tracing::info!(collected, saved, elapsed_ms, "news collection complete");
            (
                CollectionReport::succeeded(collected, saved),
                FunctionLog::success(COLLECT_FUNCTION_NAME, elapsed_ms),
                Some(trigger),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, elapsed_ms, "news collection failed");
            let message = e.to_string();
            (
                CollectionReport::failed(message.clone()),
                FunctionLog::error(COLLECT_FUNCTION_NAME, elapsed_ms, message),
                None,
            )
        }
    };

    if let Err(e) = store.insert_function_log(&log).await {
        tracing::warn!(error = %e, "failed to record collection function log");
    }

    CollectionRun { report, trigger }
}

async fn collect_and_persist(
    config: &AppConfig,
    program: &ProgramProfile,
    store: &dyn ArticleStore,
) -> Result<(usize, u64, JoinHandle<()>), IngestError> {
    let (client_id, client_secret) = config.search_credentials()?;
    let search = SearchClient::with_base_url(
        client_id,
        client_secret,
        SEARCH_TIMEOUT_SECS,
        &config.search_base_url,
    )?;
    let collector = Collector::new(program)?;
    let fingerprinter = build_fingerprinter(config)?;

    let since = Utc::now() - Duration::hours(config.dedup.window_hours);
    let mut window = store.recent_window(since, config.dedup.window_limit).await?;
    tracing::debug!(window = window.len(), "loaded dedup window");

    let mut accepted: Vec<CandidateArticle> = Vec::new();
    for keyword in &program.keywords {
        let items = match search.search_news(keyword).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(keyword, error = %e, "keyword search failed, skipping");
                continue;
            }
        };

        for candidate in collector.candidates(keyword, items) {
            if let Some(candidate) =
                admit(fingerprinter.as_ref(), &mut window, candidate).await
            {
                accepted.push(candidate);
            }
        }
    }

    let collected = accepted.len();
    let unique = dedupe_by_url(accepted);
    tracing::info!(
        collected,
        unique = unique.len(),
        "candidates ready to persist"
    );

    let rows: Vec<NewArticle> = unique.into_iter().map(NewArticle::from).collect();
    let saved = store.upsert_articles(&rows).await?;

    let trigger = ThumbnailTrigger::new(
        &config.enrich_endpoint,
        config.service_key.as_deref(),
        TRIGGER_TIMEOUT_SECS,
    )?;
    let handle = trigger.spawn(ThumbnailTrigger::limit_for(saved));

    Ok((collected, saved, handle))
}

/// Fingerprints `candidate` and returns it unless it matches the window.
/// An admitted candidate is appended to the window.
async fn admit(
    fingerprinter: &dyn Fingerprinter,
    window: &mut Vec<RecentArticle>,
    mut candidate: CandidateArticle,
) -> Option<CandidateArticle> {
    let fingerprint = fingerprinter.fingerprint(&candidate).await;

    if let Some(fp) = &fingerprint {
        if let Some(dup) = window.iter().find(|r| fingerprinter.matches(fp, r)) {
            tracing::debug!(
                url = %candidate.article_url,
                duplicate_of = %dup.article_url,
                "dropping duplicate candidate"
            );
            return None;
        }
    }

    if let Some(Fingerprint::Embedding(vector)) = fingerprint {
        candidate.embedding = Some(vector);
    }
    window.push(candidate.to_recent());
    Some(candidate)
}

/// Keeps the first candidate for each `article_url`.
fn dedupe_by_url(candidates: Vec<CandidateArticle>) -> Vec<CandidateArticle> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.article_url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::{url_hash, ContentHashFingerprinter};

    fn candidate(url: &str, title: &str) -> CandidateArticle {
        CandidateArticle {
            title: title.to_string(),
            article_url: url.to_string(),
            source: "news".to_string(),
            summary: String::new(),
            published_at: Utc::now(),
            keywords: vec!["나는솔로".to_string()],
            cast_members: vec![],
            status: "collected".to_string(),
            hash: url_hash(url),
            content_hash: crate::fingerprint::content_hash(title, ""),
            embedding: None,
        }
    }

    #[test]
    fn dedupe_by_url_keeps_first_occurrence() {
        let out = dedupe_by_url(vec![
            candidate("https://a/1", "first"),
            candidate("https://a/2", "other"),
            candidate("https://a/1", "second"),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "first");
    }

    #[tokio::test]
    async fn admit_drops_match_and_grows_window() {
        let mut window = Vec::new();
        let f = ContentHashFingerprinter;

        let first = admit(&f, &mut window, candidate("https://a/1", "같은 제목")).await;
        assert!(first.is_some());
        assert_eq!(window.len(), 1);

        let repost = admit(&f, &mut window, candidate("https://b/9", "같은 제목")).await;
        assert!(repost.is_none(), "same text from another URL is a duplicate");
        assert_eq!(window.len(), 1);
    }
}
