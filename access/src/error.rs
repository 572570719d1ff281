//! Error types for document access.
//!
//! Decode failures are normally recovered inside the accessor as a warning
//! plus "no value"; they only surface here from strict reads.

use metatree_core::{DecodeError, SchemaError};
use thiserror::Error;

/// Errors that can occur while reading or mutating a document.
#[derive(Debug, Error)]
pub enum AccessError {
    /// A required path or node is absent and cannot be created.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation is not allowed, or not modeled by the engine.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Attribute text does not match its declared kind (strict reads only).
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The document does not fit its schema.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Child index past the end of the child slot.
    #[error("index {index} out of bounds for {len} children")]
    IndexOutOfBounds { index: usize, len: usize },

    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`AccessError`].
pub type Result<T> = std::result::Result<T, AccessError>;
