use thiserror::Error;

/// Core error type shared across phonelist crates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Malformed country/area code, inconsistent digit length or invalid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for results returned by phonelist crates.
pub type Result<T> = std::result::Result<T, Error>;
