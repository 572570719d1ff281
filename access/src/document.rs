//! Document instances as an arena of nodes.
//!
//! A [`Document`] stores every [`DocumentNode`] in one vector addressed by
//! [`NodeId`]. Ids stay valid for the life of the document: removed nodes
//! are detached from their parent and marked as such, never reused. Any
//! number of accessors can share one document through a
//! [`SharedDocument`] handle.
//!
//! Every node carries a generation number. Each mutation stamps the mutated
//! node and all of its ancestors with a fresh value from a document-wide
//! counter, so a cache built against a node can tell whether anything in its
//! subtree changed since.

use std::cell::RefCell;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;
use metatree_core::{Schema, SchemaError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AccessConfig;
use crate::error::{AccessError, Result};

/// Handle to a document shared by several accessors.
pub type SharedDocument = Rc<RefCell<Document>>;

/// Stable identity of a node within its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// One element instance: attribute texts plus ordered children.
#[derive(Debug, Clone)]
pub struct DocumentNode {
    name: String,
    attributes: IndexMap<String, String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    generation: u64,
    attached: bool,
}

impl DocumentNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stored text of an attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Generation of the last change in this node's subtree.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `false` once the node has been removed from the tree.
    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

/// Serialized form of a document subtree.
///
/// # Examples
///
/// ```
/// use metatree_access::RawNode;
///
/// let raw = RawNode::new("Grid")
///     .with_attribute("name", "Mercator")
///     .with_child(RawNode::new("citation").with_attribute("title", "Atlas"));
/// let json = serde_json::to_string(&raw).unwrap();
/// assert_eq!(serde_json::from_str::<RawNode>(&json).unwrap(), raw);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RawNode>,
}

impl RawNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, name: &str, text: &str) -> Self {
        self.attributes.insert(name.to_string(), text.to_string());
        self
    }

    pub fn with_child(mut self, child: RawNode) -> Self {
        self.children.push(child);
        self
    }
}

/// A mutable tree instance bound to a [`Schema`].
#[derive(Debug)]
pub struct Document {
    schema: Arc<Schema>,
    config: AccessConfig,
    nodes: Vec<DocumentNode>,
    root: NodeId,
    clock: u64,
}

impl Document {
    /// Creates a document holding only the schema's root element.
    pub fn new(schema: Arc<Schema>, config: AccessConfig) -> Self {
        let root = DocumentNode {
            name: schema.root_name().to_string(),
            attributes: IndexMap::new(),
            children: Vec::new(),
            parent: None,
            generation: 0,
            attached: true,
        };
        Self {
            schema,
            config,
            nodes: vec![root],
            root: NodeId(0),
            clock: 0,
        }
    }

    /// Wraps the document in a handle accessors can share.
    pub fn into_shared(self) -> SharedDocument {
        Rc::new(RefCell::new(self))
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    pub fn is_read_only(&self) -> bool {
        self.config.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.config.read_only = read_only;
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns a node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` belongs to another document.
    pub fn node(&self, id: NodeId) -> &DocumentNode {
        &self.nodes[id.0]
    }

    /// Iterates over the children of `parent` named `name`.
    pub fn children_named<'a>(
        &'a self,
        parent: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = NodeId> + use<'a> {
        self.node(parent)
            .children
            .iter()
            .copied()
            .filter(move |&child| self.node(child).name == name)
    }

    /// Slash-separated path from the root to `id`, the root itself excluded.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current.filter(|&n| n != self.root) {
            names.push(self.node(node).name.as_str());
            current = self.node(node).parent;
        }
        names.reverse();
        names.join("/")
    }

    /// Appends a new child element under `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unsupported`] on a read-only document, or
    /// [`AccessError::NotFound`] if `parent` was removed.
    pub fn create_child(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        self.check_writable("create child")?;
        self.check_attached(parent)?;
        let id = NodeId(self.nodes.len());
        self.nodes.push(DocumentNode {
            name: name.to_string(),
            attributes: IndexMap::new(),
            children: Vec::new(),
            parent: Some(parent),
            generation: self.clock,
            attached: true,
        });
        self.nodes[parent.0].children.push(id);
        self.touch(parent);
        Ok(id)
    }

    /// Detaches `id` and its subtree from the tree.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unsupported`] on a read-only document or for
    /// the root, or [`AccessError::NotFound`] if the node was already removed.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        self.check_writable("remove child")?;
        self.check_attached(id)?;
        let Some(parent) = self.node(id).parent else {
            return Err(AccessError::Unsupported("cannot remove the root".to_string()));
        };
        self.nodes[parent.0].children.retain(|&child| child != id);
        self.nodes[id.0].parent = None;

        let mut pending = vec![id];
        while let Some(node) = pending.pop() {
            let node = &mut self.nodes[node.0];
            node.attached = false;
            pending.extend(node.children.iter().copied());
        }
        self.touch(parent);
        Ok(())
    }

    /// Stores attribute text, or removes the attribute for `None`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unsupported`] on a read-only document, or
    /// [`AccessError::NotFound`] if the node was removed.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, text: Option<String>) -> Result<()> {
        self.check_writable("set attribute")?;
        self.check_attached(id)?;
        let attributes = &mut self.nodes[id.0].attributes;
        let changed = match text {
            Some(text) => attributes.insert(name.to_string(), text.clone()).as_ref() != Some(&text),
            None => attributes.shift_remove(name).is_some(),
        };
        if changed {
            self.touch(id);
        }
        Ok(())
    }

    /// Builds a document from its serialized form.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Schema`] if the root name differs from the
    /// schema root, or a child is not declared under its parent.
    pub fn from_raw(schema: Arc<Schema>, raw: &RawNode, config: AccessConfig) -> Result<Self> {
        if raw.name != schema.root_name() {
            return Err(SchemaError::UnknownNode(raw.name.clone()).into());
        }
        let read_only = config.read_only;
        let mut document = Self::new(schema, AccessConfig { read_only: false, ..config });
        let root = document.root;
        document.import(root, raw)?;
        document.config.read_only = read_only;
        debug!(
            root = %raw.name,
            nodes = document.nodes.len(),
            "Imported document"
        );
        Ok(document)
    }

    fn import(&mut self, id: NodeId, raw: &RawNode) -> Result<()> {
        // Blank text means unset.
        self.nodes[id.0].attributes = raw
            .attributes
            .iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(name, text)| (name.clone(), text.clone()))
            .collect();
        for child in &raw.children {
            let parent_name = self.node(id).name.clone();
            if self.schema.child(&parent_name, &child.name).is_none() {
                return Err(SchemaError::UnknownNode(format!("{parent_name}/{}", child.name)).into());
            }
            let child_id = self.create_child(id, &child.name)?;
            self.import(child_id, child)?;
        }
        Ok(())
    }

    /// Returns the serialized form of the whole tree.
    pub fn to_raw(&self) -> RawNode {
        self.export(self.root)
    }

    fn export(&self, id: NodeId) -> RawNode {
        let node = self.node(id);
        RawNode {
            name: node.name.clone(),
            attributes: node.attributes.clone(),
            children: node.children.iter().map(|&child| self.export(child)).collect(),
        }
    }

    /// Loads a document from a JSON file of [`RawNode`]s.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Io`] if the file cannot be read,
    /// [`AccessError::Json`] if parsing fails, or the errors of
    /// [`from_raw`](Self::from_raw).
    pub fn load_json(schema: Arc<Schema>, path: impl AsRef<Path>, config: AccessConfig) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let raw: RawNode = serde_json::from_reader(reader)?;
        Self::from_raw(schema, &raw, config)
    }

    /// Writes the document as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Io`] if the file cannot be written, or
    /// [`AccessError::Json`] if serialization fails.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.to_raw())?;
        Ok(())
    }

    fn check_writable(&self, operation: &str) -> Result<()> {
        if self.config.read_only {
            return Err(AccessError::Unsupported(format!(
                "{operation} on a read-only document"
            )));
        }
        Ok(())
    }

    fn check_attached(&self, id: NodeId) -> Result<()> {
        if self.node(id).attached {
            Ok(())
        } else {
            Err(AccessError::NotFound(format!(
                "removed node '{}'",
                self.node(id).name
            )))
        }
    }

    fn touch(&mut self, id: NodeId) {
        self.clock += 1;
        let mut current = Some(id);
        while let Some(node) = current {
            self.nodes[node.0].generation = self.clock;
            current = self.nodes[node.0].parent;
        }
    }
}
