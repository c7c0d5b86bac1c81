//! Common error types for partnav

use thiserror::Error;

/// Common result type for partnav operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the navigator crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog snapshot or event payload could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file is not valid TOML for the expected schema
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog snapshot violates a structural invariant
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Requested entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Catalog data provider failed to answer a request
    #[error("Provider error: {0}")]
    Provider(String),
}
