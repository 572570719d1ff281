//! Error types for value decoding and schema construction.

use thiserror::Error;

/// A textual value does not match the grammar of its declared kind.
///
/// Accessors normally recover from these locally by logging a warning and
/// returning "no value"; strict reads propagate them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Text is not one of `true|yes|on` or `false|no|off`.
    #[error("not a boolean: {0}")]
    NotABoolean(String),

    /// Text is not a number of the expected kind.
    #[error("not a valid {kind}: {text}")]
    NotANumber { text: String, kind: &'static str },

    /// Text does not follow the `yyyy-MM-dd HH:mm:ss` pattern.
    #[error("not a date in yyyy-MM-dd HH:mm:ss form: {0}")]
    NotADate(String),

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("invalid unit symbol: {0}")]
    InvalidUnit(String),

    /// Text names no member of the enumeration.
    #[error("unknown code '{text}', expected one of: {}", allowed.join(", "))]
    UnknownCode { text: String, allowed: Vec<String> },

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Lists of lists have no textual form.
    #[error("nested lists cannot be encoded as attribute text")]
    NestedList,

    /// A decoded value has a different kind than the one requested.
    #[error("expected {expected} value, found {found}")]
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// Errors raised while building or querying a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// No element with this name exists in the schema.
    #[error("unknown schema node: {0}")]
    UnknownNode(String),

    /// A sibling with this name already exists.
    #[error("duplicate schema node '{name}' under '{parent}'")]
    DuplicateName { parent: String, name: String },

    /// More than one candidate was found where exactly one is expected.
    #[error("ambiguous schema for {subject}: {}", candidates.join(", "))]
    AmbiguousSchema {
        subject: String,
        candidates: Vec<String>,
    },

    /// The same element name was introduced twice for different types.
    #[error("element '{name}' already defined for {existing}, cannot redefine for {requested}")]
    SchemaConflict {
        name: String,
        existing: String,
        requested: String,
    },

    /// The requested change would break a structural invariant.
    #[error("invalid schema structure at '{node}': {reason}")]
    InvalidStructure { node: String, reason: String },
}

/// Convenience alias for results with [`SchemaError`].
pub type Result<T> = std::result::Result<T, SchemaError>;
