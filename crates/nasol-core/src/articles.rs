use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle tag written on every freshly collected article.
pub const ARTICLE_STATUS_COLLECTED: &str = "collected";

/// A news article as stored in the `articles` table.
///
/// `article_url` is the external identity: re-collecting the same URL
/// overwrites the row rather than inserting a second one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub article_url: String,
    /// First DNS label of the article host, e.g. `"news"` for `www.news.com`.
    pub source: String,
    /// Cleaned description, at most 150 characters.
    pub summary: Option<String>,
    pub published_at: DateTime<Utc>,
    pub thumbnail_url: Option<String>,
    pub thumbnail_status: Option<String>,
    pub keywords: Vec<String>,
    pub cast_members: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome recorded once the thumbnail enricher has visited an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailStatus {
    Success,
    Failed,
}

impl ThumbnailStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ThumbnailStatus::Success => "success",
            ThumbnailStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ThumbnailStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionStatus {
    Success,
    Error,
}

impl FunctionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FunctionStatus::Success => "success",
            FunctionStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for FunctionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Audit record for one function invocation. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionLog {
    pub function_name: String,
    pub status: FunctionStatus,
    /// Wall-clock duration of the run in milliseconds.
    pub execution_time: i64,
    pub error_message: Option<String>,
}

impl FunctionLog {
    #[must_use]
    pub fn success(function_name: &str, execution_time: i64) -> Self {
        Self {
            function_name: function_name.to_string(),
            status: FunctionStatus::Success,
            execution_time,
            error_message: None,
        }
    }

    #[must_use]
    pub fn error(function_name: &str, execution_time: i64, message: impl Into<String>) -> Self {
        Self {
            function_name: function_name.to_string(),
            status: FunctionStatus::Error,
            execution_time,
            error_message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thumbnail_status_serializes_lowercase() {
        let json = serde_json::to_string(&ThumbnailStatus::Failed).unwrap();
        assert_eq!(json, "\"failed\"");
        assert_eq!(ThumbnailStatus::Success.to_string(), "success");
    }

    #[test]
    fn function_log_error_carries_message() {
        let log = FunctionLog::error("scheduled-news-fetch", 120, "db down");
        assert_eq!(log.status, FunctionStatus::Error);
        assert_eq!(log.error_message.as_deref(), Some("db down"));
        assert_eq!(log.status.as_str(), "error");
    }

    #[test]
    fn function_log_success_has_no_message() {
        let log = FunctionLog::success("enrich-thumbnails", 5);
        assert_eq!(log.status, FunctionStatus::Success);
        assert!(log.error_message.is_none());
    }
}
