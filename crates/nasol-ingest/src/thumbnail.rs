//! Social-preview image discovery for article pages.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, Url};

use crate::error::IngestError;

static META_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid regex"));
static IMG_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("valid regex"));
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid regex")
});

/// Meta keys checked in priority order, matched against `property` or `name`.
const META_KEYS: [&str; 4] = [
    "og:image",
    "og:image:secure_url",
    "twitter:image",
    "twitter:image:src",
];

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Fetches article pages and extracts a thumbnail URL from them.
#[derive(Clone)]
pub struct ThumbnailFetcher {
    client: Client,
}

impl ThumbnailFetcher {
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(timeout_secs: u64) -> Result<Self, IngestError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("ko-KR,ko;q=0.9,en;q=0.8"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(BROWSER_UA)
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }

    /// Returns the page's thumbnail, or `None` on any fetch failure,
    /// non-2xx status, or page without a usable image.
    pub async fn fetch(&self, article_url: &str) -> Option<String> {
        let response = match self.client.get(article_url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(url = article_url, error = %e, "thumbnail fetch failed");
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::debug!(url = article_url, status = %response.status(), "thumbnail fetch non-2xx");
            return None;
        }
        let html = response.text().await.ok()?;
        extract_thumbnail(&html, article_url)
    }
}

/// Finds the preview image in `html`: the first meta key in priority order
/// that resolves, else the first `<img src>` that is not a `data:` URI.
#[must_use]
pub fn extract_thumbnail(html: &str, page_url: &str) -> Option<String> {
    let metas: Vec<Vec<(String, String)>> = META_TAG_RE
        .find_iter(html)
        .map(|m| parse_attrs(m.as_str()))
        .collect();

    for key in META_KEYS {
        let found = metas.iter().find_map(|attrs| {
            let is_key = attrs.iter().any(|(name, value)| {
                (name == "property" || name == "name") && value.trim().eq_ignore_ascii_case(key)
            });
            if !is_key {
                return None;
            }
            attr(attrs, "content").and_then(|c| resolve_url(c, page_url))
        });
        if found.is_some() {
            return found;
        }
    }

    IMG_TAG_RE.find_iter(html).find_map(|m| {
        let attrs = parse_attrs(m.as_str());
        attr(&attrs, "src").and_then(|src| resolve_url(src, page_url))
    })
}

fn parse_attrs(tag: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(tag)
        .map(|c| {
            let value = c.get(2).or_else(|| c.get(3)).map_or("", |m| m.as_str());
            (c[1].to_ascii_lowercase(), value.to_string())
        })
        .collect()
}

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

/// Resolves an image reference found on `page_url` to an absolute URL.
///
/// `&amp;` is decoded first. Absolute http(s) URLs are kept, `//host/p`
/// becomes `https://host/p`, anything else is joined to the page URL.
/// `data:` URIs and empty values yield `None`.
///
/// Path-relative references follow RFC 3986 and resolve against the page's
/// directory, not the host root: `img/a.png` on `https://ex.com/news/1` is
/// `https://ex.com/news/img/a.png`.
#[must_use]
pub fn resolve_url(candidate: &str, page_url: &str) -> Option<String> {
    let candidate = candidate.trim().replace("&amp;", "&");
    if candidate.is_empty() || candidate.to_ascii_lowercase().starts_with("data:") {
        return None;
    }

    let lower = candidate.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(candidate);
    }
    if candidate.starts_with("//") {
        return Some(format!("https:{candidate}"));
    }

    let base = Url::parse(page_url).ok()?;
    base.join(&candidate).ok().map(|u| u.to_string())
}
