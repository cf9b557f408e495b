use thiserror::Error;

/// Errors raised by the route-planning core.
///
/// The core never partially succeeds: a call either returns a (possibly
/// empty) result or fails validation before any search work begins.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to fetch road graph: {0}")]
    GraphFetchError(String),
    #[error("cache I/O error: {0}")]
    CacheIo(#[from] std::io::Error),
    #[error("cache JSON error: {0}")]
    CacheJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
