//! Named collection of schema nodes with lookup tables.
//!
//! A [`Schema`] owns every element node, indexed by name. Element names are
//! unique within one schema, so child relationships are stored as names and
//! one element may be linked under several parents. Attribute names are only
//! unique within their owning element.
//!
//! # Example
//!
//! ```
//! use metatree_core::*;
//!
//! let mut schema = Schema::new("image", "ImageMetadata");
//! schema
//!     .add_element("ImageMetadata", SchemaNode::element("Bands", ChildPolicy::Repeat, Cardinality::unbounded(0)))
//!     .unwrap();
//! schema
//!     .add_element("Bands", SchemaNode::element("Band", ChildPolicy::Empty, Cardinality::OPTIONAL))
//!     .unwrap();
//! schema
//!     .add_attribute("Band", SchemaNode::attribute("name", ValueType::scalar(PrimitiveType::String)))
//!     .unwrap();
//!
//! assert_eq!(schema.repeat_component("Bands").unwrap().name, "Band");
//! assert_eq!(schema.paths_to("Band"), vec!["Bands/Band".to_string()]);
//! assert!(schema.attribute("Band", "name").is_some());
//! ```

use std::collections::HashSet;
use std::fmt::Write as _;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::types::{Cardinality, ChildPolicy, NodeKind, SchemaNode};

/// Declarative description of valid tree shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    name: String,
    root: String,
    elements: IndexMap<String, SchemaNode>,
    /// Per element: originating property key to chosen child or attribute name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    method_names: IndexMap<String, IndexMap<String, String>>,
}

impl Schema {
    /// Creates a schema whose root element accepts any subset of children.
    pub fn new(name: impl Into<String>, root: impl Into<String>) -> Self {
        let root = root.into();
        let mut elements = IndexMap::new();
        elements.insert(
            root.clone(),
            SchemaNode::element(root.clone(), ChildPolicy::Some, Cardinality::MANDATORY),
        );
        Self {
            name: name.into(),
            root,
            elements,
            method_names: IndexMap::new(),
        }
    }

    /// Parses a schema from JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the text is not a valid schema.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Serializes the schema as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root_name(&self) -> &str {
        &self.root
    }

    /// The root element, `None` for a schema loaded without one.
    pub fn root(&self) -> Option<&SchemaNode> {
        self.elements.get(&self.root)
    }

    /// Number of element nodes, root included.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.len() <= 1
    }

    pub fn contains(&self, name: &str) -> bool {
        self.elements.contains_key(name)
    }

    /// Looks up an element by name.
    pub fn element(&self, name: &str) -> Option<&SchemaNode> {
        self.elements.get(name)
    }

    /// Looks up an element by name for in-place edits.
    pub fn element_mut(&mut self, name: &str) -> Option<&mut SchemaNode> {
        self.elements.get_mut(name)
    }

    /// Iterates over all elements in insertion order.
    pub fn elements(&self) -> impl Iterator<Item = &SchemaNode> {
        self.elements.values()
    }

    /// Looks up an attribute of an element.
    pub fn attribute(&self, element: &str, name: &str) -> Option<&SchemaNode> {
        self.element(element)?.find_attribute(name)
    }

    /// Iterates over the child elements declared under `element`.
    pub fn children<'a>(&'a self, element: &str) -> impl Iterator<Item = &'a SchemaNode> + use<'a> {
        self.element(element)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|name| self.elements.get(name))
    }

    /// Returns the child element `name` if it is declared under `parent`.
    pub fn child(&self, parent: &str, name: &str) -> Option<&SchemaNode> {
        let node = self.element(parent)?;
        if node.children.iter().any(|c| c == name) {
            self.element(name)
        } else {
            None
        }
    }

    /// Returns the repeated component of a [`Repeat`](ChildPolicy::Repeat) element.
    pub fn repeat_component(&self, element: &str) -> Option<&SchemaNode> {
        let node = self.element(element)?;
        match (node.policy(), node.children.as_slice()) {
            (ChildPolicy::Repeat, [only]) => self.element(only),
            _ => None,
        }
    }

    /// Adds a new element under `parent`.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnknownNode`] if `parent` does not exist.
    /// - [`SchemaError::DuplicateName`] if an element named like `node`
    ///   already exists anywhere in the schema.
    /// - [`SchemaError::InvalidStructure`] if `node` is not an element, or
    ///   `parent` cannot accept another child.
    pub fn add_element(&mut self, parent: &str, node: SchemaNode) -> Result<()> {
        if node.kind != NodeKind::Element {
            return Err(SchemaError::InvalidStructure {
                node: node.name,
                reason: "attributes must be added with add_attribute".to_string(),
            });
        }
        if self.elements.contains_key(&node.name) {
            return Err(SchemaError::DuplicateName {
                parent: parent.to_string(),
                name: node.name,
            });
        }
        self.link_child(parent, &node.name)?;
        self.elements.insert(node.name.clone(), node);
        Ok(())
    }

    /// Links an element that already exists under one more parent.
    ///
    /// Linking twice under the same parent is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownNode`] if either element is missing, or
    /// [`SchemaError::InvalidStructure`] if `parent` cannot accept it.
    pub fn add_existing_element(&mut self, parent: &str, name: &str) -> Result<()> {
        if !self.elements.contains_key(name) {
            return Err(SchemaError::UnknownNode(name.to_string()));
        }
        let already_linked = self
            .element(parent)
            .is_some_and(|p| p.children.iter().any(|c| c == name));
        if already_linked {
            return Ok(());
        }
        self.link_child(parent, name)
    }

    fn link_child(&mut self, parent: &str, name: &str) -> Result<()> {
        let parent_node = self
            .elements
            .get_mut(parent)
            .ok_or_else(|| SchemaError::UnknownNode(parent.to_string()))?;
        match parent_node.policy() {
            ChildPolicy::Empty => {
                return Err(SchemaError::InvalidStructure {
                    node: parent.to_string(),
                    reason: "element declares no children".to_string(),
                });
            }
            ChildPolicy::Repeat if !parent_node.children.is_empty() => {
                return Err(SchemaError::InvalidStructure {
                    node: parent.to_string(),
                    reason: "a repeated element has exactly one component".to_string(),
                });
            }
            _ => {}
        }
        parent_node.children.push(name.to_string());
        Ok(())
    }

    /// Adds an attribute to `element`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownNode`] if `element` is missing,
    /// [`SchemaError::DuplicateName`] if the element already has an attribute
    /// with this name, or [`SchemaError::InvalidStructure`] if `node` is not
    /// an attribute.
    pub fn add_attribute(&mut self, element: &str, node: SchemaNode) -> Result<()> {
        if node.kind != NodeKind::Attribute {
            return Err(SchemaError::InvalidStructure {
                node: node.name,
                reason: "elements must be added with add_element".to_string(),
            });
        }
        let owner = self
            .elements
            .get_mut(element)
            .ok_or_else(|| SchemaError::UnknownNode(element.to_string()))?;
        if owner.find_attribute(&node.name).is_some() {
            return Err(SchemaError::DuplicateName {
                parent: element.to_string(),
                name: node.name,
            });
        }
        owner.attributes.push(node);
        Ok(())
    }

    /// Records that property `key` of `element` was mapped to `name`.
    pub fn record_method_name(&mut self, element: &str, key: &str, name: &str) {
        self.method_names
            .entry(element.to_string())
            .or_default()
            .insert(key.to_string(), name.to_string());
    }

    /// Returns the tree name recorded for property `key` of `element`.
    pub fn method_name(&self, element: &str, key: &str) -> Option<&str> {
        self.method_names
            .get(element)?
            .get(key)
            .map(String::as_str)
    }

    /// Returns the description of an element, or of one of its attributes.
    pub fn description(&self, element: &str, attribute: Option<&str>) -> Option<&str> {
        let node = self.element(element)?;
        match attribute {
            Some(name) => node.find_attribute(name)?.description.as_deref(),
            None => node.description.as_deref(),
        }
    }

    /// Lists every `/`-separated path from the root to `element`.
    ///
    /// The root itself is reached by the empty path. Elements linked under
    /// several parents yield several paths.
    pub fn paths_to(&self, element: &str) -> Vec<String> {
        let mut found = Vec::new();
        if element == self.root {
            found.push(String::new());
            return found;
        }
        let mut path = Vec::new();
        let mut on_stack = HashSet::new();
        on_stack.insert(self.root.as_str());
        self.collect_paths(&self.root, element, &mut path, &mut on_stack, &mut found);
        found
    }

    fn collect_paths<'a>(
        &'a self,
        current: &'a str,
        target: &str,
        path: &mut Vec<&'a str>,
        on_stack: &mut HashSet<&'a str>,
        found: &mut Vec<String>,
    ) {
        let Some(node) = self.element(current) else {
            return;
        };
        for child in &node.children {
            if !on_stack.insert(child.as_str()) {
                continue;
            }
            path.push(child);
            if child == target {
                found.push(path.join("/"));
            } else {
                self.collect_paths(child, target, path, on_stack, found);
            }
            path.pop();
            on_stack.remove(child.as_str());
        }
    }

    /// Returns the unique path to the element derived from `type_name`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::AmbiguousSchema`] when the type is reachable
    /// through more than one path.
    pub fn path_for_origin(&self, type_name: &str) -> Result<Option<String>> {
        let mut paths = Vec::new();
        for node in self.elements.values() {
            if node.origin.as_ref().is_some_and(|o| o.type_name == type_name) {
                paths.extend(self.paths_to(&node.name));
            }
        }
        match paths.len() {
            0 => Ok(None),
            1 => Ok(paths.pop()),
            _ => Err(SchemaError::AmbiguousSchema {
                subject: format!("type {type_name}"),
                candidates: paths,
            }),
        }
    }

    /// Renders the schema as an indented outline.
    ///
    /// Each element line shows the child policy and bounds; attribute lines
    /// show the value type. Elements already printed on the current branch
    /// are marked with `...` instead of being expanded again.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        let mut on_stack = HashSet::new();
        self.render_element(&self.root, 0, &mut on_stack, &mut out);
        out
    }

    fn render_element<'a>(
        &'a self,
        name: &'a str,
        depth: usize,
        on_stack: &mut HashSet<&'a str>,
        out: &mut String,
    ) {
        let indent = "  ".repeat(depth);
        let Some(node) = self.element(name) else {
            let _ = writeln!(out, "{indent}{name} (missing)");
            return;
        };
        if !on_stack.insert(name) {
            let _ = writeln!(out, "{indent}{name} ...");
            return;
        }
        let max = node
            .cardinality
            .max
            .map_or_else(|| "*".to_string(), |m| m.to_string());
        let _ = writeln!(
            out,
            "{indent}{name} ({:?}, {}..{max})",
            node.policy(),
            node.cardinality.min
        );
        for attribute in &node.attributes {
            let kind = attribute.value_kind().map(|k| k.label()).unwrap_or("?");
            let _ = writeln!(out, "{indent}  @{}: {kind}", attribute.name);
        }
        for child in &node.children {
            self.render_element(child, depth + 1, on_stack, out);
        }
        on_stack.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{PrimitiveType, StandardId, ValueType};

    use super::*;

    fn sample() -> Schema {
        let mut schema = Schema::new("test", "Root");
        schema
            .add_element(
                "Root",
                SchemaNode::element("Citation", ChildPolicy::Some, Cardinality::OPTIONAL)
                    .with_origin(StandardId::new("iso", "Citation")),
            )
            .unwrap();
        schema
            .add_element(
                "Root",
                SchemaNode::element("Identification", ChildPolicy::Some, Cardinality::OPTIONAL),
            )
            .unwrap();
        schema
            .add_attribute(
                "Citation",
                SchemaNode::attribute("title", ValueType::scalar(PrimitiveType::String))
                    .with_description("Name of the resource"),
            )
            .unwrap();
        schema
    }

    #[test]
    fn test_duplicate_element_rejected() {
        let mut schema = sample();
        let err = schema
            .add_element(
                "Identification",
                SchemaNode::element("Citation", ChildPolicy::Some, Cardinality::OPTIONAL),
            )
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateName { .. }));
    }

    #[test]
    fn test_existing_element_links_second_parent() {
        let mut schema = sample();
        schema.add_existing_element("Identification", "Citation").unwrap();
        schema.add_existing_element("Identification", "Citation").unwrap();
        assert_eq!(schema.element("Identification").unwrap().children.len(), 1);
        assert_eq!(
            schema.paths_to("Citation"),
            vec!["Citation".to_string(), "Identification/Citation".to_string()]
        );
        assert!(matches!(
            schema.path_for_origin("Citation"),
            Err(SchemaError::AmbiguousSchema { .. })
        ));
    }

    #[test]
    fn test_repeat_accepts_single_component() {
        let mut schema = Schema::new("test", "Root");
        schema
            .add_element(
                "Root",
                SchemaNode::element("Axes", ChildPolicy::Repeat, Cardinality::unbounded(0)),
            )
            .unwrap();
        schema
            .add_element(
                "Axes",
                SchemaNode::element("Axis", ChildPolicy::Empty, Cardinality::OPTIONAL),
            )
            .unwrap();
        let err = schema
            .add_element(
                "Axes",
                SchemaNode::element("Other", ChildPolicy::Empty, Cardinality::OPTIONAL),
            )
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidStructure { .. }));
        assert_eq!(schema.repeat_component("Axes").unwrap().name, "Axis");
    }

    #[test]
    fn test_attribute_added_only_to_elements_that_exist() {
        let mut schema = sample();
        let err = schema
            .add_attribute(
                "Missing",
                SchemaNode::attribute("x", ValueType::scalar(PrimitiveType::Double)),
            )
            .unwrap_err();
        assert_eq!(err, SchemaError::UnknownNode("Missing".to_string()));
    }

    #[test]
    fn test_description_lookup() {
        let schema = sample();
        assert_eq!(
            schema.description("Citation", Some("title")),
            Some("Name of the resource")
        );
        assert_eq!(schema.description("Citation", None), None);
    }

    #[test]
    fn test_json_roundtrip_preserves_method_names() {
        let mut schema = sample();
        schema.record_method_name("Citation", "getTitle", "title");
        let json = schema.to_json().unwrap();
        let back = Schema::from_json(&json).unwrap();
        assert_eq!(back, schema);
        assert_eq!(back.method_name("Citation", "getTitle"), Some("title"));
    }

    #[test]
    fn test_root_missing_from_json() {
        let schema = Schema::from_json(r#"{"name": "empty", "root": "Root", "elements": {}}"#).unwrap();
        assert!(schema.root().is_none());
        assert_eq!(sample().root().unwrap().children.len(), 2);
    }

    #[test]
    fn test_render_tree_marks_cycles() {
        let mut schema = sample();
        schema.add_existing_element("Citation", "Root").unwrap();
        let text = schema.render_tree();
        assert!(text.starts_with("Root (Some, 1..1)"));
        assert!(text.contains("    Root ..."));
        assert!(text.contains("@title: string"));
    }
}
