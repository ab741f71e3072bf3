//! HTTP client for the Naver news-search API.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::IngestError;

const DEFAULT_BASE_URL: &str = "https://openapi.naver.com/";
const NEWS_PATH: &str = "v1/search/news.json";
/// Results per keyword. Only the first page is read.
const PAGE_SIZE: &str = "10";

/// One raw result from the news-search API.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub title: String,
    #[serde(default)]
    pub originallink: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "pubDate")]
    pub pub_date: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    items: Vec<SearchItem>,
}

/// Client for the news-search API.
///
/// Use [`SearchClient::new`] for production or [`SearchClient::with_base_url`]
/// to point at a mock server in tests.
pub struct SearchClient {
    client: Client,
    client_id: String,
    client_secret: String,
    base_url: Url,
}

impl SearchClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(client_id: &str, client_secret: &str, timeout_secs: u64) -> Result<Self, IngestError> {
        Self::with_base_url(client_id, client_secret, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`IngestError::Search`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        client_id: &str,
        client_secret: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        // Exactly one trailing slash so `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| IngestError::Search(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            client_id: client_id.to_owned(),
            client_secret: client_secret.to_owned(),
            base_url,
        })
    }

    /// Fetches the newest page of news results for `keyword`.
    ///
    /// # Errors
    ///
    /// - [`IngestError::Search`] on a non-2xx status.
    /// - [`IngestError::Http`] on network failure.
    /// - [`IngestError::Deserialize`] if the body does not match the expected shape.
    pub async fn search_news(&self, keyword: &str) -> Result<Vec<SearchItem>, IngestError> {
        let url = self.build_url(keyword)?;

        let response = self
            .client
            .get(url)
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Search(format!(
                "keyword '{keyword}' returned status {status}"
            )));
        }

        let body = response.text().await?;
        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| IngestError::Deserialize {
                context: format!("news search(query={keyword})"),
                source: e,
            })?;

        tracing::debug!(
            keyword,
            total = parsed.total,
            returned = parsed.items.len(),
            "news search complete"
        );
        Ok(parsed.items)
    }

    fn build_url(&self, keyword: &str) -> Result<Url, IngestError> {
        let mut url = self
            .base_url
            .join(NEWS_PATH)
            .map_err(|e| IngestError::Search(format!("invalid search path: {e}")))?;
        url.query_pairs_mut()
            .append_pair("query", keyword)
            .append_pair("display", PAGE_SIZE)
            .append_pair("sort", "date");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_url_encodes_keyword_and_fixes_paging() {
        let client = SearchClient::with_base_url("id", "secret", 10, "https://openapi.naver.com")
            .expect("client");
        let url = client.build_url("나는 솔로").unwrap();
        assert_eq!(url.path(), "/v1/search/news.json");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("query".to_string(), "나는 솔로".to_string()),
                ("display".to_string(), "10".to_string()),
                ("sort".to_string(), "date".to_string()),
            ]
        );
    }

    #[test]
    fn search_item_deserializes_api_shape() {
        let json = r#"{
            "title": "<b>나는솔로</b> 27기",
            "originallink": "https://www.news.com/a/1",
            "link": "https://n.news.naver.com/a/1",
            "description": "영수 근황",
            "pubDate": "Mon, 19 Oct 2026 10:00:00 +0900"
        }"#;
        let item: SearchItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.originallink, "https://www.news.com/a/1");
        assert_eq!(item.pub_date, "Mon, 19 Oct 2026 10:00:00 +0900");
    }
}
