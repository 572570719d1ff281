//! Path-addressed accessors and live views over schema-bound attribute trees.
//!
//! A [`Document`] holds the instance tree for a [`Schema`](metatree_core::Schema).
//! Callers reach into it through:
//!
//! - [`Accessor`] — a cursor on the node at a `/`-separated path, which
//!   enumerates one slot of that node's children and reads or writes the
//!   attributes of whichever node it is focused on. Values are decoded and
//!   encoded with [`metatree_core::coder`]; bad text becomes a [`Warning`]
//!   plus "no value".
//! - [`View`] — an object answering the properties of an [`InterfaceDesc`]
//!   from the node it wraps, with nested views and [`ViewList`]s for
//!   structured properties. Answers are cached until the subtree changes.
//!
//! Behaviour is tuned by [`AccessConfig`] (read-only, strict decoding,
//! warning level), loadable from YAML.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use metatree_access::*;
//! use metatree_core::*;
//!
//! let mut schema = Schema::new("raster", "Root");
//! schema
//!     .add_element("Root", SchemaNode::element("bands", ChildPolicy::Repeat, Cardinality::unbounded(0)))
//!     .unwrap();
//! schema
//!     .add_element("bands", SchemaNode::element("band", ChildPolicy::Empty, Cardinality::unbounded(0)))
//!     .unwrap();
//! schema
//!     .add_attribute("band", SchemaNode::attribute("name", ValueType::scalar(PrimitiveType::String)))
//!     .unwrap();
//!
//! let document = Document::new(Arc::new(schema), AccessConfig::default()).into_shared();
//! let mut bands = Accessor::new(&document, "bands", ChildSlot::Auto).unwrap();
//! let index = bands.append_child().unwrap();
//! bands.select_child(index).unwrap();
//! bands.set("name", "red").unwrap();
//!
//! assert_eq!(bands.child_count(), 1);
//! assert_eq!(bands.get::<String>("name").as_deref(), Some("red"));
//! ```

pub mod accessor;
pub mod config;
pub mod document;
pub mod error;
pub mod view;
pub mod warning;

pub use accessor::{AUTO_SLOT, Accessor, ChildSlot};
pub use config::AccessConfig;
pub use document::{Document, DocumentNode, NodeId, RawNode, SharedDocument};
pub use error::{AccessError, Result};
pub use view::{
    IndexedQuery, InterfaceDesc, MAXIMUM_ATTRIBUTE, MINIMUM_ATTRIBUTE, PropertyDesc, PropertyKind,
    ResultType, View, ViewBinding, ViewContext, ViewList, ViewValue, infer_name,
};
pub use warning::{CollectingListener, Severity, Warning, WarningLevel, WarningListener};
