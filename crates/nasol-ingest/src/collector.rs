//! Turns raw search results into cleaned, relevant candidate articles.

use chrono::{DateTime, Utc};
use nasol_core::{ProgramProfile, ARTICLE_STATUS_COLLECTED};

use crate::cast::CastExtractor;
use crate::clean::{clean_text, extract_source, truncate_chars};
use crate::error::IngestError;
use crate::fingerprint::{content_hash, url_hash};
use crate::relevance::RelevanceFilter;
use crate::search::SearchItem;
use crate::types::CandidateArticle;

const SUMMARY_MAX_CHARS: usize = 150;

pub struct Collector {
    relevance: RelevanceFilter,
    cast: CastExtractor,
}

impl Collector {
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if the cast tables do not compile.
    pub fn new(program: &ProgramProfile) -> Result<Self, IngestError> {
        Ok(Self {
            relevance: RelevanceFilter::new(&program.relevance),
            cast: CastExtractor::new(&program.cast)?,
        })
    }

    /// Lazily cleans `items` and yields the ones that pass the relevance
    /// filter. Items without a usable URL or publish date are skipped.
    pub fn candidates<'a>(
        &'a self,
        keyword: &'a str,
        items: Vec<SearchItem>,
    ) -> impl Iterator<Item = CandidateArticle> + 'a {
        items
            .into_iter()
            .filter_map(move |item| self.build_candidate(keyword, item))
            .filter(move |c| {
                let keep = self
                    .relevance
                    .is_relevant(&format!("{} {}", c.title, c.summary));
                if !keep {
                    tracing::debug!(keyword, url = %c.article_url, "dropping off-topic result");
                }
                keep
            })
    }

    fn build_candidate(&self, keyword: &str, item: SearchItem) -> Option<CandidateArticle> {
        let article_url = if item.originallink.trim().is_empty() {
            item.link.trim().to_string()
        } else {
            item.originallink.trim().to_string()
        };
        if article_url.is_empty() {
            tracing::warn!(keyword, "search result without a link, skipping");
            return None;
        }

        let published_at = match DateTime::parse_from_rfc2822(item.pub_date.trim()) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(e) => {
                tracing::warn!(
                    keyword,
                    url = %article_url,
                    pub_date = %item.pub_date,
                    error = %e,
                    "unparseable pubDate, skipping"
                );
                return None;
            }
        };

        let title = clean_text(&item.title);
        let summary = truncate_chars(&clean_text(&item.description), SUMMARY_MAX_CHARS);
        let cast_members = self.cast.extract(&format!("{title} {summary}"));

        Some(CandidateArticle {
            source: extract_source(&article_url),
            hash: url_hash(&article_url),
            content_hash: content_hash(&title, &summary),
            article_url,
            title,
            summary,
            published_at,
            keywords: vec![keyword.to_string()],
            cast_members,
            status: ARTICLE_STATUS_COLLECTED.to_string(),
            embedding: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nasol_core::{CastTables, RelevanceRules};

    fn program() -> ProgramProfile {
        ProgramProfile {
            name: "나는솔로".to_string(),
            keywords: vec!["나는솔로".to_string()],
            relevance: RelevanceRules {
                phrases: vec!["나는솔로".to_string()],
                tokens: vec!["나솔".to_string()],
            },
            cast: CastTables {
                roster: vec!["영수".to_string(), "옥순".to_string()],
                honorifics: vec!["씨".to_string()],
            },
        }
    }

    fn item(title: &str, description: &str, url: &str) -> SearchItem {
        SearchItem {
            title: title.to_string(),
            originallink: url.to_string(),
            link: "https://n.news.naver.com/fallback".to_string(),
            description: description.to_string(),
            pub_date: "Mon, 19 Oct 2026 10:00:00 +0900".to_string(),
        }
    }

    #[test]
    fn builds_cleaned_candidate_with_cast_and_source() {
        let collector = Collector::new(&program()).unwrap();
        let items = vec![item(
            "<b>나는솔로</b> 27기 영수 근황",
            "&quot;영수&quot;가 밝힌 최종 선택 비하인드",
            "https://www.news.com/a/1",
        )];

        let out: Vec<_> = collector.candidates("나는솔로", items).collect();
        assert_eq!(out.len(), 1);
        let c = &out[0];
        assert_eq!(c.title, "나는솔로 27기 영수 근황");
        assert_eq!(c.summary, "\"영수\"가 밝힌 최종 선택 비하인드");
        assert_eq!(c.source, "news");
        assert_eq!(c.cast_members, vec!["영수"]);
        assert_eq!(c.keywords, vec!["나는솔로"]);
        assert_eq!(c.status, "collected");
        assert_eq!(c.hash.len(), 64);
        assert!(c.embedding.is_none());
        assert_eq!(c.published_at.to_rfc3339(), "2026-10-19T01:00:00+00:00");
    }

    #[test]
    fn falls_back_to_link_when_originallink_is_empty() {
        let collector = Collector::new(&program()).unwrap();
        let out: Vec<_> = collector
            .candidates("나솔", vec![item("나솔 특집", "", "")])
            .collect();
        assert_eq!(out[0].article_url, "https://n.news.naver.com/fallback");
        assert_eq!(out[0].source, "n");
    }

    #[test]
    fn drops_off_topic_and_undated_items() {
        let collector = Collector::new(&program()).unwrap();
        let mut undated = item("나는솔로 소식", "", "https://www.news.com/a/2");
        undated.pub_date = "yesterday".to_string();
        let items = vec![
            item("솔로 가수 컴백", "솔로 앨범", "https://www.news.com/a/3"),
            undated,
        ];
        assert_eq!(collector.candidates("나는솔로", items).count(), 0);
    }

    #[test]
    fn summary_is_cut_to_150_characters() {
        let collector = Collector::new(&program()).unwrap();
        let long = "나는솔로 ".repeat(60);
        let out: Vec<_> = collector
            .candidates("나는솔로", vec![item("나는솔로", &long, "https://x.com/1")])
            .collect();
        assert_eq!(out[0].summary.chars().count(), 150);
    }
}
