use thiserror::Error;

/// Fatal, construction-time failures. Recoverable conditions (fallback
/// embedding model, missing re-ranker) are logged and degraded instead of
/// surfaced as error values.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
