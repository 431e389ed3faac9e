use anyhow::Context as _;
use std::path::Path;
use thiserror::Error;

/// Contract violations reported by the rating engine
#[derive(Debug, Error, PartialEq)]
pub enum RatingError {
    #[error("rating deviation must be positive and finite, got {0}")]
    InvalidDeviation(f64),
    #[error("volatility must be positive and finite, got {0}")]
    InvalidVolatility(f64),
    #[error("rating must be finite, got {0}")]
    InvalidRating(f64),
    #[error("volatility search did not converge within {0} iterations")]
    VolatilityDidNotConverge(usize),
}

/// Add context to parse errors
pub fn parse_context(data_type: &str) -> String {
    format!("Failed to parse {}", data_type)
}

/// Add context to file read errors
pub fn read_context(path: &Path) -> String {
    format!("Failed to read {}", path.display())
}

/// Add context to cache errors
pub fn cache_context(operation: &str, key: &str) -> String {
    format!("Failed to {} cache for key: {}", operation, key)
}

/// Wrap result with parse context
pub fn with_parse_context<T, E>(result: Result<T, E>, data_type: &str) -> anyhow::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    result.context(parse_context(data_type))
}

/// Read a whole file to a string, naming the file on failure
pub fn read_to_string(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| read_context(path))
}
