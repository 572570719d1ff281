//! Structural schema validation.
//!
//! Checks the invariants a [`Schema`] must hold before documents are bound
//! to it: child references resolve, repeated elements have exactly one
//! component, bounds are ordered, enumerations are non-empty and declared
//! defaults decode under their own type. Schemas loaded from JSON bypass the
//! checks done by the mutation methods, so they should be validated first.
//!
//! # Examples
//!
//! ```
//! use metatree_core::*;
//!
//! let mut schema = Schema::new("test", "Root");
//! schema
//!     .add_attribute("Root", SchemaNode::attribute("count", ValueType::scalar(PrimitiveType::Integer)))
//!     .unwrap();
//! assert!(validate_schema(&schema).is_empty());
//!
//! // A repeated element without its component is invalid.
//! schema
//!     .add_element("Root", SchemaNode::element("Items", ChildPolicy::Repeat, Cardinality::unbounded(0)))
//!     .unwrap();
//! let errors = validate_schema(&schema);
//! assert_eq!(errors, vec![ValidationError::RepeatComponent { element: "Items".into(), found: 0 }]);
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::coder;
use crate::types::{Cardinality, ChildPolicy, NodeKind, Restriction, SchemaNode};
use crate::Schema;

/// Schema validation errors.
///
/// Each variant describes a specific structural problem. The `Display` impl
/// provides a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The root element is missing from the element table.
    #[error("root element '{0}' is not defined")]
    MissingRoot(String),
    /// A node has an empty or whitespace-only name.
    #[error("node name cannot be empty (under '{0}')")]
    EmptyName(String),
    /// An element lists a child that is not defined.
    #[error("element '{parent}' refers to undefined child '{child}'")]
    UnknownChild { parent: String, child: String },
    /// An element lists the same child twice.
    #[error("element '{parent}' lists child '{child}' more than once")]
    DuplicateChild { parent: String, child: String },
    /// Two attributes of one element share a name.
    #[error("element '{element}' declares attribute '{attribute}' more than once")]
    DuplicateAttribute { element: String, attribute: String },
    /// A repeated element does not have exactly one component.
    #[error("repeated element '{element}' must have exactly one component, found {found}")]
    RepeatComponent { element: String, found: usize },
    /// An element with the empty policy declares children.
    #[error("element '{0}' declares children despite its empty child policy")]
    ChildrenOfEmpty(String),
    /// An attribute node owns children or attributes.
    #[error("attribute '{0}' cannot have children")]
    AttributeWithChildren(String),
    /// An attribute node has no value type.
    #[error("attribute '{0}' has no value type")]
    MissingValueType(String),
    /// Minimum bound exceeds maximum bound.
    #[error("node '{node}' has min {min} greater than max {max}")]
    InvertedBounds { node: String, min: u32, max: u32 },
    /// Enumeration restriction lists no values.
    #[error("attribute '{0}' has an empty enumeration")]
    EmptyEnumeration(String),
    /// Default value does not decode under the attribute's own type.
    #[error("attribute '{attribute}' has an invalid default: {reason}")]
    InvalidDefault { attribute: String, reason: String },
}

/// Validates a schema.
///
/// Returns every problem found, in element order. An empty vector means the
/// schema is structurally sound.
pub fn validate_schema(schema: &Schema) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if schema.element(schema.root_name()).is_none() {
        errors.push(ValidationError::MissingRoot(schema.root_name().to_string()));
        return errors;
    }

    for element in schema.elements() {
        validate_element(schema, element, &mut errors);
    }

    errors
}

fn validate_element(schema: &Schema, element: &SchemaNode, errors: &mut Vec<ValidationError>) {
    if element.name.trim().is_empty() {
        errors.push(ValidationError::EmptyName(schema.root_name().to_string()));
    }
    check_bounds(&element.name, element.cardinality, errors);

    let mut seen = HashSet::new();
    for child in &element.children {
        if !seen.insert(child.as_str()) {
            errors.push(ValidationError::DuplicateChild {
                parent: element.name.clone(),
                child: child.clone(),
            });
        }
        if !schema.contains(child) {
            errors.push(ValidationError::UnknownChild {
                parent: element.name.clone(),
                child: child.clone(),
            });
        }
    }

    match element.policy() {
        ChildPolicy::Repeat if element.children.len() != 1 => {
            errors.push(ValidationError::RepeatComponent {
                element: element.name.clone(),
                found: element.children.len(),
            });
        }
        ChildPolicy::Empty if !element.children.is_empty() => {
            errors.push(ValidationError::ChildrenOfEmpty(element.name.clone()));
        }
        _ => {}
    }

    let mut seen = HashSet::new();
    for attribute in &element.attributes {
        if attribute.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName(element.name.clone()));
        }
        if !seen.insert(attribute.name.as_str()) {
            errors.push(ValidationError::DuplicateAttribute {
                element: element.name.clone(),
                attribute: attribute.name.clone(),
            });
        }
        validate_attribute(attribute, errors);
    }
}

fn validate_attribute(attribute: &SchemaNode, errors: &mut Vec<ValidationError>) {
    if attribute.kind != NodeKind::Attribute
        || !attribute.children.is_empty()
        || !attribute.attributes.is_empty()
    {
        errors.push(ValidationError::AttributeWithChildren(attribute.name.clone()));
    }
    check_bounds(&attribute.name, attribute.cardinality, errors);

    if let Some(Restriction::Enumeration(values)) = &attribute.restriction {
        if values.is_empty() {
            errors.push(ValidationError::EmptyEnumeration(attribute.name.clone()));
        }
    }

    let Some(kind) = attribute.value_kind() else {
        errors.push(ValidationError::MissingValueType(attribute.name.clone()));
        return;
    };

    if let Some(default) = &attribute.default_value {
        let text = coder::encode(default);
        if let Err(err) = coder::decode(&text, &kind) {
            errors.push(ValidationError::InvalidDefault {
                attribute: attribute.name.clone(),
                reason: err.to_string(),
            });
        }
    }
}

fn check_bounds(node: &str, cardinality: Cardinality, errors: &mut Vec<ValidationError>) {
    if let Some(max) = cardinality.max {
        if cardinality.min > max {
            errors.push(ValidationError::InvertedBounds {
                node: node.to_string(),
                min: cardinality.min,
                max,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{PrimitiveType, ValueType};
    use crate::value::Value;

    use super::*;

    #[test]
    fn test_valid_schema_has_no_errors() {
        let mut schema = Schema::new("test", "Root");
        schema
            .add_attribute(
                "Root",
                SchemaNode::attribute("visible", ValueType::scalar(PrimitiveType::Boolean))
                    .with_default(Value::Boolean(false)),
            )
            .unwrap();
        assert!(validate_schema(&schema).is_empty());
    }

    #[test]
    fn test_rejects_bad_default() {
        let mut schema = Schema::new("test", "Root");
        schema
            .add_attribute(
                "Root",
                SchemaNode::attribute("count", ValueType::scalar(PrimitiveType::Integer))
                    .with_default(Value::String("many".into())),
            )
            .unwrap();
        let errors = validate_schema(&schema);
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::InvalidDefault { attribute, .. }] if attribute == "count"
        ));
    }

    #[test]
    fn test_rejects_inverted_bounds_and_empty_enumeration() {
        let mut schema = Schema::new("test", "Root");
        schema
            .add_attribute(
                "Root",
                SchemaNode::attribute("kind", ValueType::scalar(PrimitiveType::String))
                    .with_cardinality(Cardinality::new(3, Some(1)))
                    .with_restriction(Restriction::Enumeration(Vec::new())),
            )
            .unwrap();
        let errors = validate_schema(&schema);
        assert_eq!(
            errors,
            vec![
                ValidationError::InvertedBounds {
                    node: "kind".into(),
                    min: 3,
                    max: 1
                },
                ValidationError::EmptyEnumeration("kind".into()),
            ]
        );
    }

    #[test]
    fn test_rejects_dangling_child_from_json() {
        let json = r#"{
            "name": "broken",
            "root": "Root",
            "elements": {
                "Root": {
                    "name": "Root",
                    "kind": "Element",
                    "child_policy": "Some",
                    "cardinality": { "min": 1, "max": 1 },
                    "children": ["Ghost"]
                }
            }
        }"#;
        let schema = Schema::from_json(json).unwrap();
        assert_eq!(
            validate_schema(&schema),
            vec![ValidationError::UnknownChild {
                parent: "Root".into(),
                child: "Ghost".into()
            }]
        );
    }
}
