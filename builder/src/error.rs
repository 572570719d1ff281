//! Error types for loading metadata standard descriptions.
//!
//! Schema derivation itself fails with
//! [`SchemaError`](metatree_core::SchemaError); this module covers reading
//! standards from text and files.

use thiserror::Error;

/// Errors that can occur while loading a standard description.
#[derive(Debug, Error)]
pub enum StandardError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A property type string could not be parsed.
    #[error("invalid type reference: '{0}'")]
    InvalidType(String),

    /// The file extension names no supported format.
    #[error("unsupported standard format: {0}")]
    UnsupportedFormat(String),
}

/// Convenience alias for results with [`StandardError`].
pub type Result<T> = std::result::Result<T, StandardError>;
