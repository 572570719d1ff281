//! Schema node definitions for typed attribute trees.
//!
//! A [`SchemaNode`] describes one position in the tree: either an element,
//! which may own attributes and child elements, or an attribute carrying a
//! leaf value. The types are designed for serialization with [`serde`] so a
//! derived schema can be stored as JSON and reloaded without re-running the
//! builder.

use serde::{Deserialize, Serialize};

use crate::value::{NumberRange, Value, ValueKind};

/// Whether a schema node is an element or an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// A node that may own attributes and child elements.
    Element,
    /// A leaf carrying a textual value.
    Attribute,
}

/// Rule governing which children an element may have.
///
/// # Examples
///
/// ```
/// use metatree_core::ChildPolicy;
///
/// assert_eq!(ChildPolicy::default(), ChildPolicy::Some);
/// assert!(ChildPolicy::Repeat.is_repeat());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ChildPolicy {
    /// Every child must be present, in order.
    All,
    /// Any subset of the children may be present (the default).
    #[default]
    Some,
    /// Exactly one of the children may be present.
    Choice,
    /// A single component element repeated a bounded number of times.
    Repeat,
    /// No child elements.
    Empty,
}

impl ChildPolicy {
    /// Returns `true` for [`ChildPolicy::Repeat`].
    pub fn is_repeat(self) -> bool {
        self == ChildPolicy::Repeat
    }
}

/// Occurrence bounds of a node.
///
/// For an element with the [`Repeat`](ChildPolicy::Repeat) policy the bounds
/// apply to the number of repeated components. For a list attribute they
/// bound the number of list items. Everywhere else they describe how often
/// the node itself may occur under its parent.
///
/// # Examples
///
/// ```
/// use metatree_core::Cardinality;
///
/// let many = Cardinality::unbounded(1);
/// assert!(many.allows(1));
/// assert!(many.allows(10_000));
/// assert!(!many.allows(0));
/// assert!(Cardinality::OPTIONAL.allows(0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cardinality {
    /// Minimum number of occurrences.
    pub min: u32,
    /// Maximum number of occurrences, `None` for unbounded.
    pub max: Option<u32>,
}

impl Cardinality {
    /// Zero or one occurrence.
    pub const OPTIONAL: Cardinality = Cardinality {
        min: 0,
        max: Some(1),
    };
    /// Exactly one occurrence.
    pub const MANDATORY: Cardinality = Cardinality {
        min: 1,
        max: Some(1),
    };

    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Creates bounds with no upper limit.
    pub fn unbounded(min: u32) -> Self {
        Self { min, max: None }
    }

    /// Returns `true` if `count` occurrences satisfy these bounds.
    pub fn allows(&self, count: usize) -> bool {
        let count = u64::try_from(count).unwrap_or(u64::MAX);
        count >= u64::from(self.min) && self.max.is_none_or(|max| count <= u64::from(max))
    }

    /// Returns `true` if more than one occurrence is permitted.
    pub fn is_multiple(&self) -> bool {
        self.max.is_none_or(|max| max > 1)
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Self::OPTIONAL
    }
}

/// Primitive type of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    String,
    Integer,
    Float,
    Double,
    Boolean,
}

/// Whether an attribute holds one value or a whitespace-separated list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arity {
    Scalar,
    List,
}

/// Declared type of an attribute value.
///
/// # Examples
///
/// ```
/// use metatree_core::{PrimitiveType, ValueKind, ValueType};
///
/// let fill = ValueType::list(PrimitiveType::Double);
/// assert_eq!(fill.value_kind(), ValueKind::List(Box::new(ValueKind::Double)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueType {
    pub primitive: PrimitiveType,
    pub arity: Arity,
}

impl ValueType {
    pub fn scalar(primitive: PrimitiveType) -> Self {
        Self {
            primitive,
            arity: Arity::Scalar,
        }
    }

    pub fn list(primitive: PrimitiveType) -> Self {
        Self {
            primitive,
            arity: Arity::List,
        }
    }

    /// Returns the coder kind used to parse values of this type.
    pub fn value_kind(&self) -> ValueKind {
        let item = match self.primitive {
            PrimitiveType::String => ValueKind::String,
            PrimitiveType::Integer => ValueKind::Integer,
            PrimitiveType::Float => ValueKind::Float,
            PrimitiveType::Double => ValueKind::Double,
            PrimitiveType::Boolean => ValueKind::Boolean,
        };
        match self.arity {
            Arity::Scalar => item,
            Arity::List => ValueKind::List(Box::new(item)),
        }
    }
}

/// Constraint on the values an attribute accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Restriction {
    /// Numeric bounds.
    Range(NumberRange),
    /// Closed set of allowed names.
    Enumeration(Vec<String>),
}

/// Identifies the metadata standard type a schema node was derived from.
///
/// # Examples
///
/// ```
/// use metatree_core::StandardId;
///
/// let id = StandardId::new("ISO 19115", "Citation");
/// assert_eq!(id.to_string(), "ISO 19115:Citation");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StandardId {
    /// Name of the metadata standard.
    pub standard: String,
    /// Name of the type within that standard.
    pub type_name: String,
}

impl StandardId {
    pub fn new(standard: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            standard: standard.into(),
            type_name: type_name.into(),
        }
    }
}

impl std::fmt::Display for StandardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.standard, self.type_name)
    }
}

/// Declarative description of one element or attribute.
///
/// Elements own their attribute nodes directly and refer to child elements
/// by name, since element names are unique within a
/// [`Schema`](crate::Schema). Use [`element`](SchemaNode::element) and
/// [`attribute`](SchemaNode::attribute) to create nodes, then chain builder
/// methods such as [`with_restriction`](SchemaNode::with_restriction).
///
/// # Examples
///
/// ```
/// use metatree_core::*;
///
/// let kind = SchemaNode::attribute("kind", ValueType::scalar(PrimitiveType::String))
///     .with_restriction(Restriction::Enumeration(vec!["north".into(), "south".into()]));
/// assert_eq!(kind.kind, NodeKind::Attribute);
/// assert!(matches!(kind.value_kind(), Some(ValueKind::Enumeration(_))));
///
/// let axis = SchemaNode::element("Axis", ChildPolicy::Empty, Cardinality::OPTIONAL)
///     .with_attribute(kind);
/// assert!(axis.find_attribute("kind").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    /// Node name, unique among siblings.
    pub name: String,
    pub kind: NodeKind,
    /// Child policy, elements only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_policy: Option<ChildPolicy>,
    pub cardinality: Cardinality,
    /// Leaf value type, `None` for elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restriction: Option<Restriction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Standard type this node was derived from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<StandardId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Attribute nodes owned by this element.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<SchemaNode>,
    /// Names of the child elements, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
}

impl SchemaNode {
    /// Creates an element node without attributes or children.
    pub fn element(name: impl Into<String>, policy: ChildPolicy, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Element,
            child_policy: Some(policy),
            cardinality,
            value_type: None,
            restriction: None,
            default_value: None,
            origin: None,
            description: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates an optional attribute node of the given type.
    pub fn attribute(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Attribute,
            child_policy: None,
            cardinality: Cardinality::OPTIONAL,
            value_type: Some(value_type),
            restriction: None,
            default_value: None,
            origin: None,
            description: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn with_restriction(mut self, restriction: Restriction) -> Self {
        self.restriction = Some(restriction);
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_origin(mut self, origin: StandardId) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an attribute node to this element.
    pub fn with_attribute(mut self, attribute: SchemaNode) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Returns the child policy, [`ChildPolicy::Empty`] for attributes.
    pub fn policy(&self) -> ChildPolicy {
        self.child_policy.unwrap_or(ChildPolicy::Empty)
    }

    /// Finds an attribute of this element by name.
    pub fn find_attribute(&self, name: &str) -> Option<&SchemaNode> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Returns the coder kind for this attribute's values.
    ///
    /// An enumeration restriction turns a string attribute into an
    /// [`Enumeration`](ValueKind::Enumeration) kind so decoding checks
    /// membership. Returns `None` for elements.
    pub fn value_kind(&self) -> Option<ValueKind> {
        let value_type = self.value_type?;
        let kind = value_type.value_kind();
        match (&self.restriction, value_type.primitive) {
            (Some(Restriction::Enumeration(codes)), PrimitiveType::String) => {
                let codes = ValueKind::Enumeration(codes.clone());
                Some(match value_type.arity {
                    Arity::Scalar => codes,
                    Arity::List => ValueKind::List(Box::new(codes)),
                })
            }
            _ => Some(kind),
        }
    }
}
