//! Path-addressed cursors over a document.
//!
//! An [`Accessor`] is built from a path and an optional child slot. The path
//! locates a parent node (auto-created in writable documents); the slot names
//! the repeated children the accessor can enumerate. Attribute reads and
//! writes apply to the *focused* node, selected with
//! [`select_parent`](Accessor::select_parent) or
//! [`select_child`](Accessor::select_child).
//!
//! Accessors are cheap to clone. Clones share the document and can focus on
//! different siblings independently.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use metatree_access::{AccessConfig, Accessor, ChildSlot, Document};
//! use metatree_core::*;
//!
//! let mut schema = Schema::new("demo", "Root");
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
//! assert_eq!(bands.child_slot(), Some("band"));
//!
//! let index = bands.append_child().unwrap();
//! bands.select_child(index).unwrap();
//! bands.set("name", "red").unwrap();
//! assert_eq!(bands.get::<String>("name").as_deref(), Some("red"));
//! assert_eq!(bands.path(), "bands/band");
//! ```

use std::rc::Rc;
use std::sync::Arc;

use metatree_core::{
    Cardinality, ChildPolicy, DecodeError, FromAttribute, Restriction, Schema, SchemaError,
    ToAttribute, Value, ValueKind, coder,
};
use tracing::debug;

use crate::document::{NodeId, SharedDocument};
use crate::error::{AccessError, Result};
use crate::warning::{WarningLevel, WarningListener, WarningSink};

/// Slot name asking the accessor to pick the repeated component itself.
pub const AUTO_SLOT: &str = "#auto";

/// Which children of the parent node an accessor enumerates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChildSlot {
    /// No children; only the parent can be focused.
    #[default]
    None,
    /// The single component of a [`Repeat`](ChildPolicy::Repeat) parent, if any.
    Auto,
    Named(String),
}

impl ChildSlot {
    /// Parses a slot name: empty for none, [`AUTO_SLOT`] for auto.
    ///
    /// # Examples
    ///
    /// ```
    /// use metatree_access::ChildSlot;
    ///
    /// assert_eq!(ChildSlot::parse("#auto"), ChildSlot::Auto);
    /// assert_eq!(ChildSlot::parse(""), ChildSlot::None);
    /// assert_eq!(ChildSlot::parse("band"), ChildSlot::Named("band".into()));
    /// ```
    pub fn parse(text: &str) -> Self {
        match text.trim() {
            "" => ChildSlot::None,
            AUTO_SLOT => ChildSlot::Auto,
            name => ChildSlot::Named(name.to_string()),
        }
    }
}

impl From<&str> for ChildSlot {
    fn from(text: &str) -> Self {
        ChildSlot::parse(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Unfocused,
    Parent,
    Child(NodeId),
}

/// A cursor bound to one position in a document.
#[derive(Debug, Clone)]
pub struct Accessor {
    document: SharedDocument,
    schema: Arc<Schema>,
    parent: NodeId,
    slot: Option<String>,
    focus: Focus,
    strict: bool,
    warnings: WarningSink,
}

impl Accessor {
    /// Creates an accessor on the node at `path`, relative to the document root.
    ///
    /// Path segments are separated by `/`; the empty path is the root. Missing
    /// segments are created when the document is writable. The accessor starts
    /// unfocused.
    ///
    /// # Errors
    ///
    /// - [`AccessError::NotFound`] if a segment is missing in a read-only document.
    /// - [`AccessError::Schema`] if a segment to create, or a named slot, is not
    ///   declared by the schema.
    pub fn new(document: &SharedDocument, path: &str, slot: ChildSlot) -> Result<Self> {
        let (schema, root, config) = {
            let doc = document.borrow();
            (doc.schema().clone(), doc.root(), doc.config().clone())
        };
        let warnings = WarningSink::new(config.warning_level);
        let parent = resolve(document, &warnings, root, path, true)?
            .ok_or_else(|| AccessError::NotFound(path.to_string()))?;
        let slot = resolve_slot(&schema, &document.borrow().node(parent).name().to_string(), slot)?;
        Ok(Self {
            document: document.clone(),
            schema,
            parent,
            slot,
            focus: Focus::Unfocused,
            strict: config.strict,
            warnings,
        })
    }

    /// Creates an accessor on the node at `path` below the focused node.
    ///
    /// Missing segments are created as in [`new`](Self::new). The new
    /// accessor inherits strictness and warning settings.
    ///
    /// # Panics
    ///
    /// Panics if this accessor is unfocused.
    pub fn descend(&self, path: &str, slot: ChildSlot) -> Result<Accessor> {
        let parent = resolve(&self.document, &self.warnings, self.focused(), path, true)?
            .ok_or_else(|| AccessError::NotFound(path.to_string()))?;
        self.derived(parent, slot)
    }

    /// Like [`descend`](Self::descend), but never creates nodes.
    ///
    /// Returns `Ok(None)` if any segment of `path` is missing.
    ///
    /// # Panics
    ///
    /// Panics if this accessor is unfocused.
    pub fn descend_existing(&self, path: &str, slot: ChildSlot) -> Result<Option<Accessor>> {
        match resolve(&self.document, &self.warnings, self.focused(), path, false)? {
            Some(parent) => self.derived(parent, slot).map(Some),
            None => Ok(None),
        }
    }

    fn derived(&self, parent: NodeId, slot: ChildSlot) -> Result<Accessor> {
        let element = self.document.borrow().node(parent).name().to_string();
        Ok(Self {
            document: self.document.clone(),
            schema: self.schema.clone(),
            parent,
            slot: resolve_slot(&self.schema, &element, slot)?,
            focus: Focus::Unfocused,
            strict: self.strict,
            warnings: self.warnings.clone(),
        })
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Node located by the accessor's path.
    pub fn parent_id(&self) -> NodeId {
        self.parent
    }

    /// Element name of the enumerated children, if any.
    pub fn child_slot(&self) -> Option<&str> {
        self.slot.as_deref()
    }

    pub fn is_read_only(&self) -> bool {
        self.document.borrow().is_read_only()
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    pub fn warning_level(&self) -> WarningLevel {
        self.warnings.level
    }

    pub fn set_warning_level(&mut self, level: WarningLevel) {
        self.warnings.level = level;
    }

    /// Delivers this accessor's warnings to `listener` instead of the log.
    ///
    /// Accessors derived afterwards share the listener.
    pub fn set_listener(&mut self, listener: Rc<dyn WarningListener>) {
        self.warnings.listener = Some(listener);
    }

    // ------------------------------------------------------------------
    // Children
    // ------------------------------------------------------------------

    /// Current children in the slot, in document order.
    pub fn child_nodes(&self) -> Vec<NodeId> {
        match &self.slot {
            Some(slot) => self
                .document
                .borrow()
                .children_named(self.parent, slot)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn child_count(&self) -> usize {
        self.child_nodes().len()
    }

    /// Appends a child to the slot and returns its index.
    ///
    /// The new child is not selected.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unsupported`] if the document is read-only, the
    /// accessor has no slot, or the slot is already at its maximum.
    pub fn append_child(&self) -> Result<usize> {
        self.check_writable()?;
        let Some(slot) = &self.slot else {
            return Err(AccessError::Unsupported(
                "append to an accessor without child slot".to_string(),
            ));
        };
        let count = self.child_count();
        let bounds = self.slot_bounds(slot);
        if bounds.max.is_some_and(|max| count >= max as usize) {
            return Err(AccessError::Unsupported(format!(
                "'{slot}' allows at most {} children",
                bounds.max.unwrap_or_default()
            )));
        }
        self.document.borrow_mut().create_child(self.parent, slot)?;
        debug!(slot = %slot, index = count, "Appended child");
        Ok(count)
    }

    /// Removes the child at `index`; later children shift down.
    ///
    /// If the removed child was selected, the accessor becomes unfocused.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::IndexOutOfBounds`] for a bad index, or
    /// [`AccessError::Unsupported`] if the document is read-only or the slot
    /// would fall below its minimum.
    pub fn remove_child(&mut self, index: usize) -> Result<()> {
        self.check_writable()?;
        let nodes = self.child_nodes();
        let id = *nodes.get(index).ok_or(AccessError::IndexOutOfBounds {
            index,
            len: nodes.len(),
        })?;
        if let Some(slot) = &self.slot {
            let min = self.slot_bounds(slot).min as usize;
            if nodes.len() - 1 < min {
                return Err(AccessError::Unsupported(format!(
                    "'{slot}' requires at least {min} children"
                )));
            }
        }
        self.document.borrow_mut().remove_node(id)?;
        if self.focus == Focus::Child(id) {
            self.focus = Focus::Unfocused;
        }
        Ok(())
    }

    /// Removes every child in the slot.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unsupported`] if the document is read-only or
    /// the slot requires children.
    pub fn remove_children(&mut self) -> Result<()> {
        self.check_writable()?;
        let nodes = self.child_nodes();
        let Some(slot) = &self.slot else {
            return Ok(());
        };
        if !nodes.is_empty() && self.slot_bounds(slot).min > 0 {
            return Err(AccessError::Unsupported(format!(
                "'{slot}' requires at least one child"
            )));
        }
        let mut document = self.document.borrow_mut();
        for id in nodes {
            document.remove_node(id)?;
        }
        if matches!(self.focus, Focus::Child(_)) {
            self.focus = Focus::Unfocused;
        }
        Ok(())
    }

    /// Focuses the child at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::IndexOutOfBounds`] for a bad index.
    pub fn select_child(&mut self, index: usize) -> Result<()> {
        let nodes = self.child_nodes();
        let id = *nodes.get(index).ok_or(AccessError::IndexOutOfBounds {
            index,
            len: nodes.len(),
        })?;
        self.focus = Focus::Child(id);
        Ok(())
    }

    /// Focuses the node located by the path.
    pub fn select_parent(&mut self) {
        self.focus = Focus::Parent;
    }

    pub fn is_focused(&self) -> bool {
        self.focus != Focus::Unfocused
    }

    /// Index of the selected child, `None` if the parent or nothing is focused.
    pub fn selected_index(&self) -> Option<usize> {
        let Focus::Child(id) = self.focus else {
            return None;
        };
        self.child_nodes().iter().position(|&child| child == id)
    }

    /// Focused node, `None` if unfocused.
    pub fn node_id(&self) -> Option<NodeId> {
        match self.focus {
            Focus::Unfocused => None,
            Focus::Parent => Some(self.parent),
            Focus::Child(id) => Some(id),
        }
    }

    /// Element name of the focused node.
    ///
    /// # Panics
    ///
    /// Panics if the accessor is unfocused.
    pub fn element_name(&self) -> String {
        self.document
            .borrow()
            .node(self.focused())
            .name()
            .to_string()
    }

    /// Path from the root to the focused node.
    ///
    /// # Panics
    ///
    /// Panics if the accessor is unfocused.
    pub fn path(&self) -> String {
        self.document.borrow().path_of(self.focused())
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// Names of the attributes stored on the focused node.
    ///
    /// # Panics
    ///
    /// Panics if the accessor is unfocused.
    pub fn attribute_names(&self) -> Vec<String> {
        self.document
            .borrow()
            .node(self.focused())
            .attributes()
            .keys()
            .cloned()
            .collect()
    }

    /// Returns the stored text, or the encoded schema default.
    ///
    /// # Panics
    ///
    /// Panics if the accessor is unfocused.
    pub fn get_text(&self, name: &str) -> Option<String> {
        let id = self.focused();
        let doc = self.document.borrow();
        let node = doc.node(id);
        if let Some(text) = node.attribute(name) {
            return Some(text.to_string());
        }
        self.schema
            .attribute(node.name(), name)?
            .default_value
            .as_ref()
            .map(coder::encode)
    }

    /// Decodes an attribute, warning and returning `None` on failure.
    ///
    /// The attribute's declared kind is used when the schema declares it,
    /// else `fallback`.
    ///
    /// # Panics
    ///
    /// Panics if the accessor is unfocused.
    pub fn get_value(&self, name: &str, fallback: &ValueKind) -> Option<Value> {
        match self.read_value(name, fallback) {
            Ok(value) => value,
            Err(err) => {
                self.warn_attribute(name, err.to_string());
                None
            }
        }
    }

    /// Decodes an attribute, propagating decode errors.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Decode`] if the text does not match its kind.
    ///
    /// # Panics
    ///
    /// Panics if the accessor is unfocused.
    pub fn get_value_strict(&self, name: &str, fallback: &ValueKind) -> Result<Option<Value>> {
        Ok(self.read_value(name, fallback)?)
    }

    /// Reads an attribute as `T`.
    ///
    /// Returns `None` for an absent attribute, and also, with a warning, for
    /// text that does not decode.
    ///
    /// # Panics
    ///
    /// Panics if the accessor is unfocused.
    pub fn get<T: FromAttribute>(&self, name: &str) -> Option<T> {
        let value = self.get_value(name, &T::value_kind())?;
        match T::from_value(value) {
            Ok(value) => Some(value),
            Err(err) => {
                self.warn_attribute(name, err.to_string());
                None
            }
        }
    }

    /// Reads an attribute as `T`, propagating decode errors.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Decode`] if the text does not decode as `T`.
    ///
    /// # Panics
    ///
    /// Panics if the accessor is unfocused.
    pub fn get_strict<T: FromAttribute>(&self, name: &str) -> Result<Option<T>> {
        let value = self.read_value(name, &T::value_kind())?;
        Ok(value.map(T::from_value).transpose()?)
    }

    fn read_value(&self, name: &str, fallback: &ValueKind) -> std::result::Result<Option<Value>, DecodeError> {
        let id = self.focused();
        let doc = self.document.borrow();
        let node = doc.node(id);
        let declared = self.schema.attribute(node.name(), name);
        match node.attribute(name) {
            Some(text) => {
                let kind = declared
                    .and_then(|attribute| attribute.value_kind())
                    .unwrap_or_else(|| fallback.clone());
                coder::decode(text, &kind)
            }
            None => Ok(declared.and_then(|attribute| attribute.default_value.clone())),
        }
    }

    /// Writes an attribute; "no value" removes it.
    ///
    /// Text that does not fit the declared kind or restriction is stored
    /// anyway and reported as a warning.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unsupported`] if the document is read-only.
    ///
    /// # Panics
    ///
    /// Panics if the accessor is unfocused.
    pub fn set<V: ToAttribute + ?Sized>(&self, name: &str, value: &V) -> Result<()> {
        let text = value.to_value().map(|value| coder::encode(&value));
        self.set_text(name, text.as_deref().unwrap_or_default())
    }

    /// Writes attribute text; blank text removes the attribute.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unsupported`] if the document is read-only.
    ///
    /// # Panics
    ///
    /// Panics if the accessor is unfocused.
    pub fn set_text(&self, name: &str, text: &str) -> Result<()> {
        self.check_writable()?;
        let id = self.focused();
        let text = text.trim();
        if text.is_empty() {
            return self.document.borrow_mut().set_attribute(id, name, None);
        }
        self.check_declared(id, name, text);
        self.document
            .borrow_mut()
            .set_attribute(id, name, Some(text.to_string()))
    }

    /// Removes an attribute from the focused node.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unsupported`] if the document is read-only.
    ///
    /// # Panics
    ///
    /// Panics if the accessor is unfocused.
    pub fn remove_attribute(&self, name: &str) -> Result<()> {
        self.check_writable()?;
        let id = self.focused();
        self.document.borrow_mut().set_attribute(id, name, None)
    }

    /// Reports text that the schema would not accept.
    fn check_declared(&self, id: NodeId, name: &str, text: &str) {
        let element = self.document.borrow().node(id).name().to_string();
        let Some(attribute) = self.schema.attribute(&element, name) else {
            self.warn_attribute(name, format!("attribute is not declared by element '{element}'"));
            return;
        };
        let Some(kind) = attribute.value_kind() else {
            return;
        };
        let value = match coder::decode(text, &kind) {
            Ok(Some(value)) => value,
            Ok(None) => return,
            Err(err) => {
                self.warn_attribute(name, err.to_string());
                return;
            }
        };
        if let Some(Restriction::Range(range)) = &attribute.restriction {
            let items = match &value {
                Value::List(items) => items.as_slice(),
                single => std::slice::from_ref(single),
            };
            for number in items.iter().filter_map(Value::as_f64) {
                if !range.contains(number) {
                    self.warn_attribute(
                        name,
                        format!("{number} is outside {}", coder::encode(&Value::Range(range.clone()))),
                    );
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn focused(&self) -> NodeId {
        match self.focus {
            Focus::Parent => self.parent,
            Focus::Child(id) => id,
            Focus::Unfocused => {
                panic!("accessor has no focused node; call select_parent or select_child first")
            }
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.is_read_only() {
            return Err(AccessError::Unsupported(
                "mutation of a read-only document".to_string(),
            ));
        }
        Ok(())
    }

    /// Bounds on the number of children in `slot`.
    ///
    /// A repeated parent bounds its components; otherwise the child element
    /// bounds its own occurrences. A repeated element occurs at most once
    /// under its parent whatever its component bounds are.
    fn slot_bounds(&self, slot: &str) -> Cardinality {
        let doc = self.document.borrow();
        match self.schema.element(doc.node(self.parent).name()) {
            Some(parent) if parent.policy() == ChildPolicy::Repeat => parent.cardinality,
            _ => match self.schema.element(slot) {
                Some(node) if node.policy() == ChildPolicy::Repeat => {
                    Cardinality::new(node.cardinality.min.min(1), Some(1))
                }
                Some(node) => node.cardinality,
                None => Cardinality::default(),
            },
        }
    }

    fn warn_attribute(&self, name: &str, message: String) {
        let source = format!("{}@{name}", self.path());
        self.warnings.emit(&source, message);
    }

    /// Reports a warning about the focused node.
    pub(crate) fn warn(&self, message: String) {
        self.warnings.emit(&self.path(), message);
    }
}

/// Walks `path` below `start`, creating missing segments if `create` is set.
fn resolve(
    document: &SharedDocument,
    warnings: &WarningSink,
    start: NodeId,
    path: &str,
    create: bool,
) -> Result<Option<NodeId>> {
    let mut current = start;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let existing: Vec<NodeId> = document
            .borrow()
            .children_named(current, segment)
            .collect();
        current = match existing.as_slice() {
            [first, rest @ ..] => {
                if !rest.is_empty() {
                    let source = document.borrow().path_of(current);
                    warnings.emit(
                        &source,
                        format!(
                            "ambiguous path: {} children named '{segment}', using the first",
                            existing.len()
                        ),
                    );
                }
                *first
            }
            [] if !create => return Ok(None),
            [] => {
                let mut doc = document.borrow_mut();
                if doc.is_read_only() {
                    return Err(AccessError::NotFound(format!(
                        "'{segment}' in path '{path}' of a read-only document"
                    )));
                }
                let parent_name = doc.node(current).name().to_string();
                if doc.schema().child(&parent_name, segment).is_none() {
                    return Err(SchemaError::UnknownNode(format!("{parent_name}/{segment}")).into());
                }
                let id = doc.create_child(current, segment)?;
                debug!(parent = %parent_name, element = segment, "Created path segment");
                id
            }
        };
    }
    Ok(Some(current))
}

fn resolve_slot(schema: &Schema, element: &str, slot: ChildSlot) -> Result<Option<String>> {
    match slot {
        ChildSlot::None => Ok(None),
        ChildSlot::Auto => Ok(schema
            .repeat_component(element)
            .map(|component| component.name.clone())),
        ChildSlot::Named(name) => {
            if schema.child(element, &name).is_some() {
                Ok(Some(name))
            } else {
                Err(SchemaError::UnknownNode(format!("{element}/{name}")).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use metatree_core::{NumberRange, PrimitiveType, SchemaNode, ValueType};

    use super::*;
    use crate::config::AccessConfig;
    use crate::document::Document;
    use crate::warning::CollectingListener;

    fn schema() -> Arc<Schema> {
        let mut schema = Schema::new("test", "Root");
        schema
            .add_attribute(
                "Root",
                SchemaNode::attribute("scale", ValueType::scalar(PrimitiveType::Double))
                    .with_restriction(Restriction::Range(NumberRange::new(Some(0.0), Some(1.0)))),
            )
            .unwrap();
        schema
            .add_attribute(
                "Root",
                SchemaNode::attribute("visible", ValueType::scalar(PrimitiveType::Boolean))
                    .with_default(Value::Boolean(false)),
            )
            .unwrap();
        schema
            .add_element("Root", SchemaNode::element("items", ChildPolicy::Repeat, Cardinality::new(0, Some(2))))
            .unwrap();
        schema
            .add_element("items", SchemaNode::element("item", ChildPolicy::Empty, Cardinality::new(0, Some(2))))
            .unwrap();
        Arc::new(schema)
    }

    fn root(config: AccessConfig) -> Accessor {
        let document = Document::new(schema(), config).into_shared();
        let mut accessor = Accessor::new(&document, "", ChildSlot::None).unwrap();
        accessor.select_parent();
        accessor
    }

    #[test]
    fn test_default_value_when_absent() {
        let accessor = root(AccessConfig::default());
        assert_eq!(accessor.get::<bool>("visible"), Some(false));
        assert_eq!(accessor.get_text("visible").as_deref(), Some("false"));
        assert!(accessor.attribute_names().is_empty());
    }

    #[test]
    fn test_bad_text_warns_and_reads_none() {
        let mut accessor = root(AccessConfig::default());
        let listener = Rc::new(CollectingListener::default());
        accessor.set_listener(listener.clone());

        accessor.set_text("scale", "abc").unwrap();
        assert_eq!(listener.warnings().len(), 1);
        assert_eq!(accessor.get::<f64>("scale"), None);
        assert_eq!(listener.warnings().len(), 2);
        assert!(matches!(
            accessor.get_strict::<f64>("scale"),
            Err(AccessError::Decode(DecodeError::NotANumber { .. }))
        ));
    }

    #[test]
    fn test_range_violation_is_stored_with_warning() {
        let mut accessor = root(AccessConfig::default());
        let listener = Rc::new(CollectingListener::default());
        accessor.set_listener(listener.clone());

        accessor.set("scale", &2.5).unwrap();
        assert_eq!(accessor.get::<f64>("scale"), Some(2.5));
        let warnings = listener.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].source, "@scale");
    }

    #[test]
    fn test_slot_maximum_enforced() {
        let document = Document::new(schema(), AccessConfig::default()).into_shared();
        let items = Accessor::new(&document, "items", ChildSlot::Auto).unwrap();
        assert_eq!(items.append_child().unwrap(), 0);
        assert_eq!(items.append_child().unwrap(), 1);
        assert!(matches!(items.append_child(), Err(AccessError::Unsupported(_))));
        assert_eq!(items.child_count(), 2);
    }

    #[test]
    fn test_unknown_named_slot() {
        let document = Document::new(schema(), AccessConfig::default()).into_shared();
        assert!(matches!(
            Accessor::new(&document, "", ChildSlot::Named("ghost".into())),
            Err(AccessError::Schema(SchemaError::UnknownNode(_)))
        ));
    }

    #[test]
    #[should_panic(expected = "no focused node")]
    fn test_unfocused_get_panics() {
        let document = Document::new(schema(), AccessConfig::default()).into_shared();
        let accessor = Accessor::new(&document, "", ChildSlot::None).unwrap();
        let _ = accessor.get_text("scale");
    }
}
