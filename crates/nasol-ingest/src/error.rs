use thiserror::Error;

/// Errors raised by the ingestion pipeline and the thumbnail enricher.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The news-search API answered with a non-success status.
    #[error("search API error: {0}")]
    Search(String),

    /// Every embedding attempt failed, or a response had an unusable shape.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// A select, upsert or update against the article store failed.
    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Config(#[from] nasol_core::ConfigError),

    /// A response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<nasol_db::DbError> for IngestError {
    fn from(err: nasol_db::DbError) -> Self {
        Self::Storage(err.to_string())
    }
}
