//! Schema model and value coding for typed hierarchical attribute trees.
//!
//! This crate defines the foundational types for describing a tree of
//! elements and attributes:
//!
//! - [`SchemaNode`] — one element or attribute with its child policy,
//!   cardinality, value type, restriction and default.
//! - [`Schema`] — a named collection of element nodes indexed by name, plus
//!   the property-key to tree-name table recorded while deriving it.
//! - [`Value`] / [`ValueKind`] — decoded attribute values and the grammar
//!   selector used to parse them.
//! - [`coder`] — the canonical text form of every value kind.
//!
//! Validation ([`validate_schema`]) catches structural errors such as
//! dangling child references, repeated elements without a single component,
//! and defaults that do not decode.
//!
//! # Example
//!
//! ```
//! use metatree_core::*;
//!
//! let mut schema = Schema::new("raster", "RasterMetadata");
//! schema
//!     .add_attribute(
//!         "RasterMetadata",
//!         SchemaNode::attribute("fillValues", ValueType::list(PrimitiveType::Double)),
//!     )
//!     .unwrap();
//! assert!(validate_schema(&schema).is_empty());
//!
//! let kind = schema.attribute("RasterMetadata", "fillValues").unwrap().value_kind().unwrap();
//! let value = coder::decode("0 -9999", &kind).unwrap().unwrap();
//! assert_eq!(coder::encode(&value), "0 -9999");
//! ```

pub mod coder;
mod convert;
mod error;
mod schema;
mod types;
mod validate;
mod value;

pub use convert::{FromAttribute, ToAttribute};
pub use error::{DecodeError, Result, SchemaError};
pub use schema::Schema;
pub use types::*;
pub use validate::{ValidationError, validate_schema};
pub use value::{Identifier, NumberRange, Unit, Value, ValueKind};
