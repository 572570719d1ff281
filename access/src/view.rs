//! Live object-shaped views over accessors.
//!
//! A [`View`] answers property queries for an [`InterfaceDesc`] by reading
//! the node its accessor is focused on. Each property is bound once per
//! (interface, element) pair to a [`PropertyKind`]: an attribute read, a
//! nested view, a list of views, an indexed query, or "no value". Bindings
//! are shared through a [`ViewContext`].
//!
//! Property names map to tree names through the table recorded while the
//! schema was derived, falling back to [`infer_name`].
//!
//! Results are cached per property and stamped with the generation of the
//! viewed node. A write anywhere in the node's subtree makes the entry stale;
//! nested views and lists are reused as long as they still point at the same
//! node.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use metatree_access::*;
//! use metatree_core::*;
//!
//! let mut schema = Schema::new("demo", "Root");
//! schema
//!     .add_attribute("Root", SchemaNode::attribute("name", ValueType::scalar(PrimitiveType::String)))
//!     .unwrap();
//! let document = Document::new(Arc::new(schema), AccessConfig::default()).into_shared();
//!
//! let interface = Arc::new(
//!     InterfaceDesc::new("Named").with_property(PropertyDesc::value("getName", ValueKind::String)),
//! );
//! let view = View::open(&document, "", interface).unwrap();
//! view.accessor().set("name", "Mercator").unwrap();
//! assert_eq!(view.get::<String>("getName").unwrap().as_deref(), Some("Mercator"));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;
use metatree_core::{ChildPolicy, FromAttribute, Schema, Value, ValueKind};
use tracing::debug;

use crate::accessor::{Accessor, ChildSlot};
use crate::document::{NodeId, SharedDocument};
use crate::error::{AccessError, Result};

/// Attribute listing per-dimension lower bounds for indexed queries.
pub const MINIMUM_ATTRIBUTE: &str = "minimum";
/// Attribute listing per-dimension upper bounds for indexed queries.
pub const MAXIMUM_ATTRIBUTE: &str = "maximum";

/// Property-style interface a view implements.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDesc {
    pub name: String,
    pub properties: Vec<PropertyDesc>,
}

impl InterfaceDesc {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: PropertyDesc) -> Self {
        self.properties.push(property);
        self
    }

    pub fn property(&self, key: &str) -> Option<&PropertyDesc> {
        self.properties.iter().find(|p| p.key == key)
    }
}

/// One property of an interface.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDesc {
    pub key: String,
    pub result: ResultType,
    /// Number of arguments the property takes.
    pub arguments: usize,
}

impl PropertyDesc {
    /// A nullable single value.
    pub fn value(key: &str, kind: ValueKind) -> Self {
        Self::new(key, ResultType::Value { kind, nullable: true })
    }

    /// A non-nullable single value, defaulting to zero, `false` or NaN.
    pub fn primitive(key: &str, kind: ValueKind) -> Self {
        Self::new(key, ResultType::Value { kind, nullable: false })
    }

    /// A list of values stored in one attribute.
    pub fn values(key: &str, kind: ValueKind) -> Self {
        Self::new(key, ResultType::Values(kind))
    }

    pub fn structured(key: &str, interface: Arc<InterfaceDesc>) -> Self {
        Self::new(key, ResultType::Structured(interface))
    }

    pub fn structured_list(key: &str, interface: Arc<InterfaceDesc>) -> Self {
        Self::new(key, ResultType::StructuredList(interface))
    }

    pub fn with_arguments(mut self, arguments: usize) -> Self {
        self.arguments = arguments;
        self
    }

    fn new(key: &str, result: ResultType) -> Self {
        Self {
            key: key.to_string(),
            result,
            arguments: 0,
        }
    }
}

/// Declared result of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultType {
    Value { kind: ValueKind, nullable: bool },
    Values(ValueKind),
    Structured(Arc<InterfaceDesc>),
    StructuredList(Arc<InterfaceDesc>),
}

/// Indexed queries over the `minimum`/`maximum` attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexedQuery {
    Minimum,
    Maximum,
    Span,
    Median,
}

impl IndexedQuery {
    /// Recognizes `getMinimum`, `getMaximum`, `getSpan` and `getMedian`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "getMinimum" => Some(IndexedQuery::Minimum),
            "getMaximum" => Some(IndexedQuery::Maximum),
            "getSpan" => Some(IndexedQuery::Span),
            "getMedian" => Some(IndexedQuery::Median),
            _ => None,
        }
    }
}

/// How a property is answered for one element.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    Scalar {
        attribute: String,
        kind: ValueKind,
        nullable: bool,
    },
    List {
        attribute: String,
        kind: ValueKind,
    },
    /// Nested view on a child element.
    Element {
        child: String,
        interface: Arc<InterfaceDesc>,
    },
    /// Live list over the children in `slot` of the node at `path`.
    Repeated {
        path: String,
        slot: ChildSlot,
        interface: Arc<InterfaceDesc>,
    },
    /// One-element list over a child that occurs at most once.
    Single {
        child: String,
        interface: Arc<InterfaceDesc>,
    },
    Indexed(IndexedQuery),
    /// No attribute or child matches; always "no value".
    Absent,
    Unsupported(String),
}

/// Property bindings of one interface on one element.
#[derive(Debug)]
pub struct ViewBinding {
    interface: Arc<InterfaceDesc>,
    element: String,
    properties: IndexMap<String, PropertyKind>,
}

impl ViewBinding {
    /// Binds every property of `interface` against `element`.
    pub fn new(schema: &Schema, interface: Arc<InterfaceDesc>, element: &str) -> Self {
        let properties = interface
            .properties
            .iter()
            .map(|property| (property.key.clone(), bind(schema, element, property)))
            .collect();
        Self {
            interface,
            element: element.to_string(),
            properties,
        }
    }

    pub fn interface(&self) -> &Arc<InterfaceDesc> {
        &self.interface
    }

    pub fn element(&self) -> &str {
        &self.element
    }

    pub fn kind(&self, key: &str) -> Option<&PropertyKind> {
        self.properties.get(key)
    }
}

fn bind(schema: &Schema, element: &str, property: &PropertyDesc) -> PropertyKind {
    if property.arguments > 0 {
        return match IndexedQuery::from_key(&property.key) {
            Some(query) if property.arguments == 1 => PropertyKind::Indexed(query),
            _ => PropertyKind::Unsupported(format!(
                "'{}' takes {} arguments",
                property.key, property.arguments
            )),
        };
    }
    let inferred = infer_name(&property.key);
    let name = schema
        .method_name(element, &property.key)
        .or_else(|| schema.method_name(element, &inferred))
        .map(str::to_string)
        .unwrap_or(inferred);

    match &property.result {
        ResultType::Value { kind, nullable } => match schema.attribute(element, &name) {
            Some(_) => PropertyKind::Scalar {
                attribute: name,
                kind: kind.clone(),
                nullable: *nullable,
            },
            None => PropertyKind::Absent,
        },
        ResultType::Values(kind) => match schema.attribute(element, &name) {
            Some(_) => PropertyKind::List {
                attribute: name,
                kind: kind.clone(),
            },
            None => PropertyKind::Absent,
        },
        ResultType::Structured(interface) => match schema.child(element, &name) {
            Some(_) => PropertyKind::Element {
                child: name,
                interface: interface.clone(),
            },
            None => PropertyKind::Absent,
        },
        ResultType::StructuredList(interface) => match schema.child(element, &name) {
            Some(child) if child.policy() == ChildPolicy::Repeat => PropertyKind::Repeated {
                path: name,
                slot: ChildSlot::Auto,
                interface: interface.clone(),
            },
            Some(child) if child.cardinality.is_multiple() => PropertyKind::Repeated {
                path: String::new(),
                slot: ChildSlot::Named(name),
                interface: interface.clone(),
            },
            Some(_) => PropertyKind::Single {
                child: name,
                interface: interface.clone(),
            },
            None => PropertyKind::Absent,
        },
    }
}

/// Tree name inferred from a getter-style property key.
///
/// A `get` or `is` prefix followed by an upper-case letter is stripped. The
/// first letter is then lower-cased unless the first two letters are both
/// upper-case.
///
/// # Examples
///
/// ```
/// use metatree_access::infer_name;
///
/// assert_eq!(infer_name("getName"), "name");
/// assert_eq!(infer_name("getCRS"), "CRS");
/// assert_eq!(infer_name("isEmpty"), "empty");
/// assert_eq!(infer_name("island"), "island");
/// assert_eq!(infer_name("Title"), "title");
/// ```
pub fn infer_name(key: &str) -> String {
    let stem = ["get", "is"]
        .iter()
        .find_map(|prefix| {
            key.strip_prefix(prefix)
                .filter(|rest| rest.starts_with(|c: char| c.is_uppercase()))
        })
        .unwrap_or(key);
    let mut chars = stem.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_uppercase() && second.is_uppercase() => {
            stem.to_string()
        }
        (Some(first), _) => first
            .to_lowercase()
            .chain(stem[first.len_utf8()..].chars())
            .collect(),
        (None, _) => String::new(),
    }
}

/// Shared cache of view bindings.
///
/// Bindings are keyed by interface identity, so two distinct interfaces that
/// share a name are bound separately.
#[derive(Debug, Default)]
pub struct ViewContext {
    bindings: RefCell<HashMap<(*const InterfaceDesc, String), Rc<ViewBinding>>>,
}

impl ViewContext {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Returns the binding of `interface` on `element`, computing it once.
    pub fn binding(&self, schema: &Schema, interface: &Arc<InterfaceDesc>, element: &str) -> Rc<ViewBinding> {
        let key = (Arc::as_ptr(interface), element.to_string());
        let cached = self.bindings.borrow().get(&key).cloned();
        if let Some(binding) = cached {
            return binding;
        }
        debug!(interface = %interface.name, element, "Binding view properties");
        let binding = Rc::new(ViewBinding::new(schema, interface.clone(), element));
        self.bindings.borrow_mut().insert(key, binding.clone());
        binding
    }

    /// Number of bindings computed so far.
    pub fn len(&self) -> usize {
        self.bindings.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.borrow().is_empty()
    }
}

/// Result of a property query.
#[derive(Debug, Clone)]
pub enum ViewValue {
    Nil,
    Scalar(Value),
    Values(Vec<Value>),
    View(Rc<View>),
    List(Rc<ViewList>),
}

impl ViewValue {
    pub fn is_nil(&self) -> bool {
        matches!(self, ViewValue::Nil)
    }
}

#[derive(Debug)]
struct Cached {
    generation: u64,
    /// Node a structured result points at, `None` for values or absent nodes.
    target: Option<NodeId>,
    value: ViewValue,
}

/// An object answering property queries from one document node.
#[derive(Debug)]
pub struct View {
    accessor: Accessor,
    node: NodeId,
    binding: Rc<ViewBinding>,
    context: Rc<ViewContext>,
    cache: RefCell<HashMap<String, Cached>>,
}

impl View {
    /// Creates a view on the node `accessor` is focused on.
    ///
    /// # Panics
    ///
    /// Panics if the accessor is unfocused.
    pub fn new(accessor: Accessor, interface: Arc<InterfaceDesc>, context: Rc<ViewContext>) -> Self {
        let element = accessor.element_name();
        let node = accessor
            .node_id()
            .unwrap_or_else(|| panic!("view on an unfocused accessor"));
        let binding = context.binding(accessor.schema(), &interface, &element);
        Self {
            accessor,
            node,
            binding,
            context,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Creates a view on the node at `path` with a fresh context.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Accessor::new`].
    pub fn open(document: &SharedDocument, path: &str, interface: Arc<InterfaceDesc>) -> Result<Self> {
        let mut accessor = Accessor::new(document, path, ChildSlot::None)?;
        accessor.select_parent();
        Ok(Self::new(accessor, interface, ViewContext::new()))
    }

    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }

    pub fn interface(&self) -> &Arc<InterfaceDesc> {
        self.binding.interface()
    }

    pub fn binding(&self) -> &ViewBinding {
        &self.binding
    }

    pub fn element_name(&self) -> &str {
        self.binding.element()
    }

    /// Answers property `key` with the given arguments.
    ///
    /// # Errors
    ///
    /// - [`AccessError::Unsupported`] if the interface has no such property,
    ///   the argument count differs, or the property shape is not modeled.
    /// - [`AccessError::IndexOutOfBounds`] for a bad index in an indexed query.
    /// - [`AccessError::Decode`] from strict accessors.
    pub fn call(&self, key: &str, args: &[i64]) -> Result<ViewValue> {
        let Some(property) = self.binding.interface().property(key) else {
            return Err(AccessError::Unsupported(format!(
                "'{key}' is not a property of {}",
                self.binding.interface().name
            )));
        };
        if args.len() != property.arguments {
            return Err(AccessError::Unsupported(format!(
                "'{key}' takes {} arguments, got {}",
                property.arguments,
                args.len()
            )));
        }
        let kind = self
            .binding
            .kind(key)
            .cloned()
            .unwrap_or(PropertyKind::Absent);
        match kind {
            PropertyKind::Indexed(query) => return self.indexed(query, args[0]),
            PropertyKind::Unsupported(reason) => return Err(AccessError::Unsupported(reason)),
            _ => {}
        }

        let generation = self.generation();
        let previous = self.cache.borrow_mut().remove(key);
        let (target, value) = match previous {
            Some(cached) if cached.generation == generation => (cached.target, cached.value),
            previous => self.resolve(key, &kind, previous)?,
        };
        self.cache.borrow_mut().insert(
            key.to_string(),
            Cached {
                generation,
                target,
                value: value.clone(),
            },
        );
        Ok(value)
    }

    /// Reads a value property as `T`; `None` for "no value".
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unsupported`] for structured properties, plus
    /// the errors of [`call`](Self::call).
    pub fn get<T: FromAttribute>(&self, key: &str) -> Result<Option<T>> {
        let value = match self.call(key, &[])? {
            ViewValue::Nil => return Ok(None),
            ViewValue::Scalar(value) => value,
            ViewValue::Values(items) => Value::List(items),
            ViewValue::View(_) | ViewValue::List(_) => {
                return Err(AccessError::Unsupported(format!(
                    "'{key}' is structured, use view or list"
                )));
            }
        };
        match T::from_value(value) {
            Ok(value) => Ok(Some(value)),
            Err(err) if self.accessor.is_strict() => Err(err.into()),
            Err(err) => {
                self.accessor.warn(format!("{key}: {err}"));
                Ok(None)
            }
        }
    }

    /// Nested view of a structured property, `None` if the node is absent.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unsupported`] for other property shapes.
    pub fn view(&self, key: &str) -> Result<Option<Rc<View>>> {
        match self.call(key, &[])? {
            ViewValue::View(view) => Ok(Some(view)),
            ViewValue::Nil => Ok(None),
            _ => Err(AccessError::Unsupported(format!("'{key}' is not a structured property"))),
        }
    }

    /// List of views of a structured list property.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unsupported`] for other property shapes.
    pub fn list(&self, key: &str) -> Result<Rc<ViewList>> {
        match self.call(key, &[])? {
            ViewValue::List(list) => Ok(list),
            ViewValue::Nil => {
                let interface = match self.interface().property(key).map(|p| &p.result) {
                    Some(ResultType::StructuredList(interface)) => interface.clone(),
                    _ => {
                        return Err(AccessError::Unsupported(format!("'{key}' is not a structured list")));
                    }
                };
                Ok(Rc::new(ViewList::fixed(None, interface, self.context.clone())))
            }
            _ => Err(AccessError::Unsupported(format!("'{key}' is not a structured list"))),
        }
    }

    fn generation(&self) -> u64 {
        self.accessor.document().borrow().node(self.node).generation()
    }

    fn resolve(&self, key: &str, kind: &PropertyKind, previous: Option<Cached>) -> Result<(Option<NodeId>, ViewValue)> {
        let (path, slot, child_interface) = match kind {
            PropertyKind::Scalar {
                attribute,
                kind,
                nullable,
            } => {
                let value = if self.accessor.is_strict() {
                    self.accessor.get_value_strict(attribute, kind)?
                } else {
                    self.accessor.get_value(attribute, kind)
                };
                let value = match value {
                    Some(value) => ViewValue::Scalar(value),
                    None if *nullable => ViewValue::Nil,
                    None => default_value(kind),
                };
                return Ok((None, value));
            }
            PropertyKind::List { attribute, kind } => {
                let list_kind = ValueKind::List(Box::new(kind.clone()));
                let value = if self.accessor.is_strict() {
                    self.accessor.get_value_strict(attribute, &list_kind)?
                } else {
                    self.accessor.get_value(attribute, &list_kind)
                };
                let items = match value {
                    Some(Value::List(items)) => items,
                    Some(single) => vec![single],
                    None => Vec::new(),
                };
                return Ok((None, ViewValue::Values(items)));
            }
            PropertyKind::Absent => {
                self.accessor.warn(format!(
                    "no attribute or child of '{}' answers '{key}'",
                    self.binding.element()
                ));
                return Ok((None, ViewValue::Nil));
            }
            PropertyKind::Element { child, interface } | PropertyKind::Single { child, interface } => {
                (child.as_str(), ChildSlot::None, interface)
            }
            PropertyKind::Repeated {
                path,
                slot,
                interface,
            } => (path.as_str(), slot.clone(), interface),
            PropertyKind::Indexed(_) | PropertyKind::Unsupported(_) => {
                return Ok((None, ViewValue::Nil));
            }
        };

        let accessor = self.accessor.descend_existing(path, slot)?;
        let target = accessor.as_ref().map(Accessor::parent_id);
        if let Some(cached) = previous.filter(|cached| cached.target.is_some() && cached.target == target) {
            return Ok((target, cached.value));
        }

        let value = match (kind, accessor) {
            (_, None) if matches!(kind, PropertyKind::Element { .. }) => ViewValue::Nil,
            (_, None) => ViewValue::List(Rc::new(ViewList::fixed(
                None,
                child_interface.clone(),
                self.context.clone(),
            ))),
            (PropertyKind::Element { .. }, Some(mut accessor)) => {
                accessor.select_parent();
                ViewValue::View(Rc::new(View::new(
                    accessor,
                    child_interface.clone(),
                    self.context.clone(),
                )))
            }
            (PropertyKind::Single { .. }, Some(mut accessor)) => {
                accessor.select_parent();
                let view = Rc::new(View::new(accessor, child_interface.clone(), self.context.clone()));
                ViewValue::List(Rc::new(ViewList::fixed(
                    Some(view),
                    child_interface.clone(),
                    self.context.clone(),
                )))
            }
            (_, Some(accessor)) => ViewValue::List(Rc::new(ViewList::live(
                accessor,
                child_interface.clone(),
                self.context.clone(),
            ))),
        };
        Ok((target, value))
    }

    fn indexed(&self, query: IndexedQuery, index: i64) -> Result<ViewValue> {
        let index = usize::try_from(index)
            .map_err(|_| AccessError::Unsupported(format!("negative dimension index {index}")))?;
        let minimum = self.bound(MINIMUM_ATTRIBUTE, index);
        let maximum = self.bound(MAXIMUM_ATTRIBUTE, index);
        let value = match query {
            IndexedQuery::Minimum => minimum?,
            IndexedQuery::Maximum => maximum?,
            IndexedQuery::Span => maximum? - minimum?,
            IndexedQuery::Median => (minimum? + maximum?) / 2.0,
        };
        Ok(ViewValue::Scalar(Value::Double(value)))
    }

    /// Element `index` of a numeric list attribute, NaN when absent.
    fn bound(&self, attribute: &str, index: usize) -> Result<f64> {
        let kind = ValueKind::List(Box::new(ValueKind::Double));
        let numbers: Vec<f64> = match self.accessor.get_value(attribute, &kind) {
            None => return Ok(f64::NAN),
            Some(Value::List(items)) => items.iter().map(|v| v.as_f64().unwrap_or(f64::NAN)).collect(),
            Some(single) => vec![single.as_f64().unwrap_or(f64::NAN)],
        };
        numbers
            .get(index)
            .copied()
            .ok_or(AccessError::IndexOutOfBounds {
                index,
                len: numbers.len(),
            })
    }
}

fn default_value(kind: &ValueKind) -> ViewValue {
    match kind {
        ValueKind::Integer => ViewValue::Scalar(Value::Integer(0)),
        ValueKind::Float => ViewValue::Scalar(Value::Float(f32::NAN)),
        ValueKind::Double => ViewValue::Scalar(Value::Double(f64::NAN)),
        ValueKind::Boolean => ViewValue::Scalar(Value::Boolean(false)),
        _ => ViewValue::Nil,
    }
}

#[derive(Debug)]
enum ListSource {
    Live(Accessor),
    Fixed(Option<Rc<View>>),
}

/// An index-addressed list of views over repeated children.
///
/// A live list reads its size from the document on every call, so children
/// added or removed through any accessor are observed. Element views are
/// built on first access and cached per node.
#[derive(Debug)]
pub struct ViewList {
    source: ListSource,
    interface: Arc<InterfaceDesc>,
    context: Rc<ViewContext>,
    elements: RefCell<HashMap<NodeId, Rc<View>>>,
}

impl ViewList {
    /// Creates a live list over the children in `accessor`'s slot.
    pub fn live(accessor: Accessor, interface: Arc<InterfaceDesc>, context: Rc<ViewContext>) -> Self {
        Self {
            source: ListSource::Live(accessor),
            interface,
            context,
            elements: RefCell::new(HashMap::new()),
        }
    }

    /// Creates a list of at most one already-built view.
    pub fn fixed(view: Option<Rc<View>>, interface: Arc<InterfaceDesc>, context: Rc<ViewContext>) -> Self {
        Self {
            source: ListSource::Fixed(view),
            interface,
            context,
            elements: RefCell::new(HashMap::new()),
        }
    }

    pub fn interface(&self) -> &Arc<InterfaceDesc> {
        &self.interface
    }

    /// Returns `true` for lists backed by a repeated child slot.
    pub fn is_live(&self) -> bool {
        matches!(self.source, ListSource::Live(_))
    }

    pub fn size(&self) -> usize {
        match &self.source {
            ListSource::Live(accessor) => accessor.child_count(),
            ListSource::Fixed(view) => usize::from(view.is_some()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// View of element `index`, built once per child node.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::IndexOutOfBounds`] for a bad index.
    pub fn get(&self, index: usize) -> Result<Rc<View>> {
        let accessor = match &self.source {
            ListSource::Fixed(view) => {
                return view
                    .clone()
                    .filter(|_| index == 0)
                    .ok_or(AccessError::IndexOutOfBounds {
                        index,
                        len: self.size(),
                    });
            }
            ListSource::Live(accessor) => accessor,
        };
        let nodes = accessor.child_nodes();
        let id = *nodes.get(index).ok_or(AccessError::IndexOutOfBounds {
            index,
            len: nodes.len(),
        })?;
        let cached = self.elements.borrow().get(&id).cloned();
        if let Some(view) = cached {
            return Ok(view);
        }
        let mut element = accessor.clone();
        element.select_child(index)?;
        let view = Rc::new(View::new(element, self.interface.clone(), self.context.clone()));
        self.elements.borrow_mut().insert(id, view.clone());
        Ok(view)
    }

    /// Views of every element, in order.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`get`](Self::get).
    pub fn views(&self) -> Result<Vec<Rc<View>>> {
        (0..self.size()).map(|index| self.get(index)).collect()
    }

    /// Appends a child to a live list and returns its view.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unsupported`] for fixed lists, plus the errors
    /// of [`Accessor::append_child`].
    pub fn append(&self) -> Result<Rc<View>> {
        match &self.source {
            ListSource::Live(accessor) => {
                let index = accessor.append_child()?;
                self.get(index)
            }
            ListSource::Fixed(_) => Err(AccessError::Unsupported(
                "append to a single-element list".to_string(),
            )),
        }
    }

    /// Removes element `index` from a live list.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unsupported`] for fixed lists, plus the errors
    /// of [`Accessor::remove_child`].
    pub fn remove(&self, index: usize) -> Result<()> {
        match &self.source {
            ListSource::Live(accessor) => {
                let id = accessor.child_nodes().get(index).copied();
                accessor.clone().remove_child(index)?;
                if let Some(id) = id {
                    self.elements.borrow_mut().remove(&id);
                }
                Ok(())
            }
            ListSource::Fixed(_) => Err(AccessError::Unsupported(
                "remove from a single-element list".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use metatree_core::{Cardinality, PrimitiveType, SchemaNode, ValueType};

    use super::*;
    use crate::config::AccessConfig;
    use crate::document::Document;

    fn schema() -> Arc<Schema> {
        let mut schema = Schema::new("test", "Root");
        schema
            .add_attribute("Root", SchemaNode::attribute("count", ValueType::scalar(PrimitiveType::Integer)))
            .unwrap();
        schema
            .add_attribute("Root", SchemaNode::attribute("minimum", ValueType::list(PrimitiveType::Double)))
            .unwrap();
        schema
            .add_attribute("Root", SchemaNode::attribute("maximum", ValueType::list(PrimitiveType::Double)))
            .unwrap();
        schema
            .add_element("Root", SchemaNode::element("origin", ChildPolicy::Empty, Cardinality::OPTIONAL))
            .unwrap();
        Arc::new(schema)
    }

    fn interface() -> Arc<InterfaceDesc> {
        let origin = Arc::new(InterfaceDesc::new("Origin"));
        Arc::new(
            InterfaceDesc::new("Box")
                .with_property(PropertyDesc::primitive("getCount", ValueKind::Integer))
                .with_property(PropertyDesc::value("getLabel", ValueKind::String))
                .with_property(PropertyDesc::structured("getOrigin", origin.clone()))
                .with_property(PropertyDesc::structured_list("getOrigins", origin))
                .with_property(PropertyDesc::primitive("getSpan", ValueKind::Double).with_arguments(1))
                .with_property(PropertyDesc::value("getCell", ValueKind::Double).with_arguments(2)),
        )
    }

    fn view() -> View {
        let document = Document::new(schema(), AccessConfig::default()).into_shared();
        View::open(&document, "", interface()).unwrap()
    }

    #[test]
    fn test_bindings() {
        let view = view();
        let binding = view.binding();
        assert!(matches!(binding.kind("getCount"), Some(PropertyKind::Scalar { attribute, .. }) if attribute == "count"));
        assert_eq!(binding.kind("getLabel"), Some(&PropertyKind::Absent));
        assert!(matches!(binding.kind("getOrigin"), Some(PropertyKind::Element { child, .. }) if child == "origin"));
        assert!(matches!(binding.kind("getOrigins"), Some(PropertyKind::Absent)));
        assert_eq!(binding.kind("getSpan"), Some(&PropertyKind::Indexed(IndexedQuery::Span)));
        assert!(matches!(binding.kind("getCell"), Some(PropertyKind::Unsupported(_))));
    }

    #[test]
    fn test_non_nullable_default() {
        let view = view();
        assert_eq!(view.get::<i64>("getCount").unwrap(), Some(0));
        assert_eq!(view.get::<String>("getLabel").unwrap(), None);
    }

    #[test]
    fn test_missing_child_is_cached_nil_until_created() {
        let view = view();
        assert!(view.view("getOrigin").unwrap().is_none());

        let origin = view.accessor().descend("origin", ChildSlot::None).unwrap();
        assert_eq!(origin.parent_id(), view.accessor().document().borrow().node(view.node).children()[0]);
        let nested = view.view("getOrigin").unwrap().unwrap();
        assert_eq!(nested.element_name(), "origin");
        assert!(Rc::ptr_eq(&nested, &view.view("getOrigin").unwrap().unwrap()));
    }

    #[test]
    fn test_indexed_queries() {
        let view = view();
        view.accessor().set("minimum", &[0.0, 10.0]).unwrap();
        view.accessor().set("maximum", &[4.0, 30.0]).unwrap();
        let span = view.call("getSpan", &[1]).unwrap();
        assert!(matches!(span, ViewValue::Scalar(Value::Double(v)) if v == 20.0));
        assert!(matches!(
            view.call("getSpan", &[2]),
            Err(AccessError::IndexOutOfBounds { index: 2, len: 2 })
        ));
        assert!(matches!(view.call("getSpan", &[]), Err(AccessError::Unsupported(_))));
        assert!(matches!(view.call("getCell", &[0, 1]), Err(AccessError::Unsupported(_))));
        assert!(matches!(view.call("getNothing", &[]), Err(AccessError::Unsupported(_))));
    }

    #[test]
    fn test_scalar_cache_refreshes_after_write() {
        let view = view();
        view.accessor().set("count", &3_i64).unwrap();
        assert_eq!(view.get::<i64>("getCount").unwrap(), Some(3));
        view.accessor().set("count", &4_i64).unwrap();
        assert_eq!(view.get::<i64>("getCount").unwrap(), Some(4));
    }

    #[test]
    fn test_binding_shared_through_context() {
        let document = Document::new(schema(), AccessConfig::default()).into_shared();
        let context = ViewContext::new();
        let mut accessor = Accessor::new(&document, "", ChildSlot::None).unwrap();
        accessor.select_parent();
        let interface = interface();
        let first = View::new(accessor.clone(), interface.clone(), context.clone());
        let second = View::new(accessor.clone(), interface, context.clone());
        assert_eq!(context.len(), 1);
        assert!(std::ptr::eq(first.binding(), second.binding()));

        let renamed = Arc::new(
            InterfaceDesc::new("Box").with_property(PropertyDesc::values("getMinimum", ValueKind::Double)),
        );
        let third = View::new(accessor, renamed, context.clone());
        assert_eq!(context.len(), 2);
        assert!(matches!(third.binding().kind("getMinimum"), Some(PropertyKind::List { .. })));
        assert!(third.call("getCount", &[]).is_err());
    }

    #[test]
    fn test_missing_list_uses_element_interface() {
        let view = view();
        let list = view.list("getOrigins").unwrap();
        assert_eq!(list.interface().name, "Origin");
        assert!(list.is_empty());
        assert!(matches!(view.list("getCount"), Err(AccessError::Unsupported(_))));
    }
}
