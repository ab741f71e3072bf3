pub mod app_config;
pub mod articles;
pub mod community;
pub mod config;
pub mod program;

use thiserror::Error;

pub use app_config::{AppConfig, DedupConfig, DedupStrategy, Environment};
pub use articles::{Article, FunctionLog, FunctionStatus, ThumbnailStatus, ARTICLE_STATUS_COLLECTED};
pub use community::{
    normalize_nickname, Comment, DraftError, NewComment, NewPost, Post, PostDetail,
    ANONYMOUS_NICKNAME,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use program::{load_program, CastTables, ProgramProfile, RelevanceRules};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read program file {path}: {source}")]
    ProgramFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse program file: {0}")]
    ProgramFileParse(#[from] serde_yaml::Error),

    #[error("program validation failed: {0}")]
    Validation(String),
}
