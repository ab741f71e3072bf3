use std::net::SocketAddr;
use std::path::PathBuf;

use crate::ConfigError;

pub const DEFAULT_EMBEDDING_MODELS: [&str; 2] = [
    "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2",
    "sentence-transformers/all-MiniLM-L6-v2",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which fingerprint the deduplicator computes and compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupStrategy {
    /// SHA-256 of the article URL. Only catches re-collected URLs.
    UrlHash,
    /// SHA-256 of normalized title + summary. Catches verbatim reposts.
    ContentHash,
    /// Sentence embedding compared by cosine similarity. Catches paraphrases.
    Embedding,
}

impl std::str::FromStr for DedupStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "url_hash" => Ok(Self::UrlHash),
            "content_hash" => Ok(Self::ContentHash),
            "embedding" => Ok(Self::Embedding),
            other => Err(format!(
                "unknown dedup strategy '{other}'; expected embedding, content_hash or url_hash"
            )),
        }
    }
}

impl std::fmt::Display for DedupStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DedupStrategy::UrlHash => write!(f, "url_hash"),
            DedupStrategy::ContentHash => write!(f, "content_hash"),
            DedupStrategy::Embedding => write!(f, "embedding"),
        }
    }
}

/// Tuning constants for the deduplicator.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupConfig {
    pub strategy: DedupStrategy,
    /// Only articles published within this many hours are compared against.
    pub window_hours: i64,
    /// Upper bound on the number of recent articles loaded for comparison.
    pub window_limit: i64,
    /// Cosine similarity at or above which a candidate counts as a duplicate.
    /// Empirically tuned; the useful range is roughly 0.82 to 0.87.
    pub similarity_threshold: f32,
    /// Storage schema width of the `embedding` column.
    pub embedding_dim: usize,
    /// Title + summary is cut to this many characters before embedding.
    pub max_input_chars: usize,
    /// Models tried in order; each is attempted through both endpoint styles.
    pub embedding_models: Vec<String>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            strategy: DedupStrategy::Embedding,
            window_hours: 24,
            window_limit: 300,
            similarity_threshold: 0.86,
            embedding_dim: 384,
            max_input_chars: 800,
            embedding_models: DEFAULT_EMBEDDING_MODELS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub program_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub naver_client_id: Option<String>,
    pub naver_client_secret: Option<String>,
    pub search_base_url: String,
    pub service_key: Option<String>,
    pub enrich_endpoint: String,
    pub hf_api_token: Option<String>,
    pub embedding_base_url: String,
    pub embedding_timeout_secs: u64,
    pub thumbnail_timeout_secs: u64,
    pub dedup: DedupConfig,
    pub collect_cron: String,
    pub require_function_auth: bool,
}

impl AppConfig {
    /// Search API credentials, required only by the collection path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] naming the first absent secret.
    pub fn search_credentials(&self) -> Result<(&str, &str), ConfigError> {
        let id = self
            .naver_client_id
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("NAVER_CLIENT_ID".to_string()))?;
        let secret = self
            .naver_client_secret
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("NAVER_CLIENT_SECRET".to_string()))?;
        Ok((id, secret))
    }

    /// The strategy actually used for a run.
    ///
    /// Semantic dedup needs an embedding token; without one the content-hash
    /// strategy takes over.
    #[must_use]
    pub fn effective_dedup_strategy(&self) -> DedupStrategy {
        match (self.dedup.strategy, &self.hf_api_token) {
            (DedupStrategy::Embedding, None) => DedupStrategy::ContentHash,
            (strategy, _) => strategy,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("program_path", &self.program_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("naver_client_id", &self.naver_client_id)
            .field(
                "naver_client_secret",
                &self.naver_client_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("search_base_url", &self.search_base_url)
            .field(
                "service_key",
                &self.service_key.as_ref().map(|_| "[redacted]"),
            )
            .field("enrich_endpoint", &self.enrich_endpoint)
            .field(
                "hf_api_token",
                &self.hf_api_token.as_ref().map(|_| "[redacted]"),
            )
            .field("embedding_base_url", &self.embedding_base_url)
            .field("embedding_timeout_secs", &self.embedding_timeout_secs)
            .field("thumbnail_timeout_secs", &self.thumbnail_timeout_secs)
            .field("dedup", &self.dedup)
            .field("collect_cron", &self.collect_cron)
            .field("require_function_auth", &self.require_function_auth)
            .finish()
    }
}
