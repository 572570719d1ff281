//! Derive attribute tree schemas from metadata standard type descriptions.
//!
//! A metadata standard describes structured types as lists of properties,
//! each with a declared type, an obligation and a multiplicity. This crate
//! reads those descriptions through [`MetadataStandard`] and turns them into
//! a [`Schema`](metatree_core::Schema):
//!
//! - [`standard`] — the reflection trait, plus [`StaticStandard`] loaded from
//!   YAML or JSON files.
//! - [`builder`] — [`SchemaBuilder`], the recursive derivation with type
//!   exclusions, substitutions and multiplicity overrides.
//!
//! # Example
//!
//! ```
//! use metatree_builder::*;
//! use metatree_core::{ChildPolicy, Schema};
//!
//! let standard = StaticStandard::from_yaml(r#"
//! name: demo
//! types:
//!   Coverage:
//!     properties:
//!       - key: bands
//!         type: Band
//!         collection: true
//!   Band:
//!     properties:
//!       - key: name
//!         type: string
//! "#).unwrap();
//!
//! let mut builder = SchemaBuilder::new(Schema::new("demo", "Root"));
//! builder.build(&standard, "Coverage", "Coverage", None, true).unwrap();
//! let schema = builder.finish();
//!
//! assert_eq!(schema.element("bands").unwrap().policy(), ChildPolicy::Repeat);
//! assert_eq!(schema.repeat_component("bands").unwrap().name, "band");
//! assert!(schema.attribute("band", "name").is_some());
//! ```

pub mod builder;
pub mod error;
pub mod standard;

pub use builder::{ARRAY_VALUES_ATTRIBUTE, SchemaBuilder, component_name};
pub use error::{Result, StandardError};
pub use standard::{MetadataStandard, Obligation, PropertyInfo, StaticStandard, TypeInfo, TypeRef};
