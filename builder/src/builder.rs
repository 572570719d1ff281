//! Schema derivation from metadata standard types.
//!
//! [`SchemaBuilder`] walks the properties of a structured type recursively
//! and adds one schema node per property:
//!
//! - enumerations become string attributes restricted to the member names;
//! - other non-structured types become attributes, scalar or list depending
//!   on multiplicity. A repeated fixed-size array gets a repeated wrapper
//!   element whose component holds the array in a single
//!   [`ARRAY_VALUES_ATTRIBUTE`] list attribute;
//! - structured types become elements. Repeated ones are wrapped in a
//!   [`Repeat`](ChildPolicy::Repeat) element with a singular component.
//!
//! The child policy of an element follows from the obligations of its
//! element-producing properties. Types already on the current expansion
//! stack are skipped, so self-referential standards terminate.

use std::collections::{HashMap, HashSet};

use metatree_core::{
    Cardinality, ChildPolicy, NumberRange, PrimitiveType, Restriction, Result, Schema,
    SchemaError, SchemaNode, StandardId, Value, ValueType,
};
use tracing::{debug, info};

use crate::standard::{MetadataStandard, Obligation, PropertyInfo, TypeRef};

/// Attribute holding the payload of each component of a repeated array.
pub const ARRAY_VALUES_ATTRIBUTE: &str = "values";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Multiplicity {
    Collection,
    Singleton,
}

/// A property ready to be turned into a schema node.
#[derive(Debug)]
struct Candidate<'p> {
    key: &'p str,
    name: &'p str,
    ty: TypeRef,
    min: u32,
    max: Option<u32>,
    /// Whether more than one value is allowed, ignoring a forbidden obligation.
    repeated: bool,
    range: Option<&'p NumberRange>,
    description: Option<&'p str>,
}

/// Derives schema nodes from the types of a [`MetadataStandard`].
///
/// # Examples
///
/// ```
/// use metatree_builder::*;
/// use metatree_core::{ChildPolicy, Schema};
///
/// let standard = StaticStandard::new("demo")
///     .with_type(
///         "Citation",
///         TypeInfo::new()
///             .with_property(PropertyInfo::new("title", "string".parse().unwrap()).mandatory())
///             .with_property(PropertyInfo::new("editions", "integer".parse().unwrap()).collection()),
///     );
///
/// let mut builder = SchemaBuilder::new(Schema::new("demo", "Root"));
/// let name = builder.build(&standard, "Citation", "Citation", None, true).unwrap();
/// assert_eq!(name, "Citation");
///
/// let schema = builder.finish();
/// let citation = schema.element("Citation").unwrap();
/// assert_eq!(citation.policy(), ChildPolicy::Some);
/// assert_eq!(schema.attribute("Citation", "title").unwrap().cardinality.min, 1);
/// assert_eq!(schema.method_name("Citation", "editions"), Some("editions"));
/// ```
#[derive(Debug)]
pub struct SchemaBuilder {
    schema: Schema,
    excluded: HashSet<String>,
    substitutions: HashMap<(String, String), Option<TypeRef>>,
    multiplicities: HashMap<(String, String), Multiplicity>,
}

impl SchemaBuilder {
    /// Creates a builder adding nodes to `schema`.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            excluded: HashSet::new(),
            substitutions: HashMap::new(),
            multiplicities: HashMap::new(),
        }
    }

    /// Skips every property whose type (or array element type) is `type_name`.
    pub fn exclude_type(mut self, type_name: &str) -> Self {
        self.excluded.insert(type_name.to_string());
        self
    }

    /// Replaces the declared type of property `key` of `owner`.
    ///
    /// `None` removes the property. Substituting an array type for a
    /// collection property collapses it to a single array value.
    pub fn substitute(mut self, owner: &str, key: &str, replacement: Option<TypeRef>) -> Self {
        self.substitutions
            .insert((owner.to_string(), key.to_string()), replacement);
        self
    }

    /// Treats a single-valued property as a collection.
    pub fn force_collection(mut self, owner: &str, key: &str) -> Self {
        self.multiplicities
            .insert((owner.to_string(), key.to_string()), Multiplicity::Collection);
        self
    }

    /// Treats a collection property as single-valued.
    pub fn force_singleton(mut self, owner: &str, key: &str) -> Self {
        self.multiplicities
            .insert((owner.to_string(), key.to_string()), Multiplicity::Singleton);
        self
    }

    /// Returns the schema built so far.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Consumes the builder and returns the schema.
    pub fn finish(self) -> Schema {
        self.schema
    }

    /// Adds the tree derived from `root_type` under `parent_name`.
    ///
    /// `parent_name` defaults to the schema root. Returns the name chosen for
    /// the top node, which may differ from `root_name` when the type is
    /// repeated or the name collided.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnknownNode`] if `root_type` is not a structured type
    ///   of `standard`, or the parent does not exist.
    /// - [`SchemaError::SchemaConflict`] if an element name is introduced
    ///   twice for different types.
    /// - [`SchemaError::AmbiguousSchema`] if a property declares both a range
    ///   and an enumeration.
    pub fn build(
        &mut self,
        standard: &dyn MetadataStandard,
        root_type: &str,
        root_name: &str,
        parent_name: Option<&str>,
        mandatory: bool,
    ) -> Result<String> {
        if !standard.is_metadata(root_type) {
            return Err(SchemaError::UnknownNode(format!(
                "{}:{root_type}",
                standard.name()
            )));
        }
        let parent = parent_name
            .unwrap_or(self.schema.root_name())
            .to_string();
        let candidate = Candidate {
            key: root_name,
            name: root_name,
            ty: TypeRef::Structured(root_type.to_string()),
            min: u32::from(mandatory),
            max: Some(1),
            repeated: false,
            range: None,
            description: None,
        };
        let mut expanding = HashSet::new();
        let name = self
            .add_node(standard, &mut expanding, &parent, &candidate)?
            .ok_or_else(|| SchemaError::InvalidStructure {
                node: root_name.to_string(),
                reason: "root type produced no node".to_string(),
            })?;
        info!(
            standard = standard.name(),
            root = %name,
            elements = self.schema.len(),
            "Derived schema"
        );
        Ok(name)
    }

    fn add_node(
        &mut self,
        standard: &dyn MetadataStandard,
        expanding: &mut HashSet<String>,
        parent: &str,
        candidate: &Candidate<'_>,
    ) -> Result<Option<String>> {
        if candidate.max == Some(0) {
            debug!(parent, node = candidate.name, "Suppressing forbidden property");
            return Ok(None);
        }
        let multiple = candidate.max.is_none_or(|max| max > 1);
        match &candidate.ty {
            TypeRef::Enumeration(enumeration) => self
                .add_enumeration(standard, parent, candidate, enumeration, multiple)
                .map(Some),
            TypeRef::Structured(type_name) if standard.is_metadata(type_name) => {
                self.add_structured(standard, expanding, parent, candidate, type_name, multiple)
            }
            TypeRef::Array(item) if multiple => self.add_array_list(parent, candidate, item).map(Some),
            _ => self.add_attribute(parent, candidate, multiple).map(Some),
        }
    }

    fn add_enumeration(
        &mut self,
        standard: &dyn MetadataStandard,
        parent: &str,
        candidate: &Candidate<'_>,
        enumeration: &str,
        multiple: bool,
    ) -> Result<String> {
        if candidate.range.is_some() {
            return Err(SchemaError::AmbiguousSchema {
                subject: format!("restriction of {parent}/{}", candidate.name),
                candidates: vec!["range".to_string(), format!("enum:{enumeration}")],
            });
        }
        let codes = standard
            .code_values(enumeration)
            .ok_or_else(|| SchemaError::UnknownNode(format!("enum:{enumeration}")))?;
        let value_type = if multiple {
            ValueType::list(PrimitiveType::String)
        } else {
            ValueType::scalar(PrimitiveType::String)
        };
        let mut node = SchemaNode::attribute(candidate.name, value_type)
            .with_cardinality(attribute_bounds(candidate, multiple))
            .with_restriction(Restriction::Enumeration(codes.to_vec()))
            .with_origin(StandardId::new(standard.name(), enumeration));
        if let Some(description) = candidate.description {
            node = node.with_description(description);
        }
        self.insert_attribute(parent, candidate, node)
    }

    fn add_attribute(&mut self, parent: &str, candidate: &Candidate<'_>, multiple: bool) -> Result<String> {
        let primitive = candidate.ty.storage_primitive();
        let list = multiple || matches!(candidate.ty, TypeRef::Array(_));
        let value_type = if list {
            ValueType::list(primitive)
        } else {
            ValueType::scalar(primitive)
        };
        let mut node =
            SchemaNode::attribute(candidate.name, value_type).with_cardinality(attribute_bounds(candidate, list));
        // Mandatory booleans must be supplied explicitly.
        if primitive == PrimitiveType::Boolean && !list && candidate.min == 0 {
            node = node.with_default(Value::Boolean(false));
        }
        if let Some(range) = candidate.range {
            node = node.with_restriction(Restriction::Range(range.clone()));
        }
        if let Some(description) = candidate.description {
            node = node.with_description(description);
        }
        self.insert_attribute(parent, candidate, node)
    }

    /// Adds an attribute, falling back to the property key on a name clash.
    fn insert_attribute(&mut self, parent: &str, candidate: &Candidate<'_>, node: SchemaNode) -> Result<String> {
        let fallback = (node.name != candidate.key).then(|| {
            let mut renamed = node.clone();
            renamed.name = candidate.key.to_string();
            renamed
        });
        let err = match self.schema.add_attribute(parent, node) {
            Ok(()) => return Ok(candidate.name.to_string()),
            Err(err) => err,
        };
        match (err, fallback) {
            (SchemaError::DuplicateName { .. }, Some(renamed)) => {
                let name = renamed.name.clone();
                debug!(parent, attribute = %name, "Renamed clashing attribute");
                self.schema.add_attribute(parent, renamed)?;
                Ok(name)
            }
            (err, _) => Err(err),
        }
    }

    fn add_array_list(&mut self, parent: &str, candidate: &Candidate<'_>, item: &TypeRef) -> Result<String> {
        if self.link_existing(parent, candidate.name, None, true)? {
            return Ok(candidate.name.to_string());
        }
        let bounds = Cardinality::new(candidate.min, candidate.max);
        let component = component_name(candidate.name, None);
        let mut wrapper = SchemaNode::element(candidate.name, ChildPolicy::Repeat, bounds);
        if let Some(description) = candidate.description {
            wrapper = wrapper.with_description(description);
        }
        self.schema.add_element(parent, wrapper)?;
        self.schema.add_element(
            candidate.name,
            SchemaNode::element(component.as_str(), ChildPolicy::Empty, bounds),
        )?;
        self.schema.add_attribute(
            &component,
            SchemaNode::attribute(ARRAY_VALUES_ATTRIBUTE, ValueType::list(item.storage_primitive()))
                .with_cardinality(Cardinality::unbounded(0)),
        )?;
        Ok(candidate.name.to_string())
    }

    fn add_structured(
        &mut self,
        standard: &dyn MetadataStandard,
        expanding: &mut HashSet<String>,
        parent: &str,
        candidate: &Candidate<'_>,
        type_name: &str,
        multiple: bool,
    ) -> Result<Option<String>> {
        if expanding.contains(type_name) {
            debug!(parent, type_name, "Skipping type already being expanded");
            return Ok(None);
        }
        let top = candidate.name.to_string();
        let (element_parent, element_name, bounds) = if multiple {
            if self.link_existing(parent, candidate.name, Some(type_name), true)? {
                return Ok(Some(top));
            }
            let bounds = Cardinality::new(candidate.min, candidate.max);
            let mut wrapper = SchemaNode::element(candidate.name, ChildPolicy::Repeat, bounds);
            if let Some(description) = candidate.description {
                wrapper = wrapper.with_description(description);
            }
            self.schema.add_element(parent, wrapper)?;
            let component = component_name(candidate.name, standard.type_identifier(type_name));
            if self.link_existing(candidate.name, &component, Some(type_name), false)? {
                return Ok(Some(top));
            }
            (candidate.name.to_string(), component, bounds)
        } else {
            if self.link_existing(parent, candidate.name, Some(type_name), false)? {
                return Ok(Some(top));
            }
            (
                parent.to_string(),
                candidate.name.to_string(),
                Cardinality::new(candidate.min.min(1), Some(1)),
            )
        };

        let policy = self.infer_policy(standard, type_name);
        let mut element = SchemaNode::element(element_name.as_str(), policy, bounds)
            .with_origin(StandardId::new(standard.name(), type_name));
        let description = if multiple {
            standard.type_description(type_name)
        } else {
            candidate.description.or_else(|| standard.type_description(type_name))
        };
        if let Some(description) = description {
            element = element.with_description(description);
        }
        self.schema.add_element(&element_parent, element)?;

        expanding.insert(type_name.to_string());
        let result = self.add_properties(standard, expanding, &element_name, type_name);
        expanding.remove(type_name);
        result?;
        Ok(Some(top))
    }

    fn add_properties(
        &mut self,
        standard: &dyn MetadataStandard,
        expanding: &mut HashSet<String>,
        element: &str,
        owner: &str,
    ) -> Result<()> {
        for property in standard.properties(owner) {
            let Some(candidate) = self.candidate(owner, property) else {
                debug!(owner, property = %property.key, "Property removed by builder hooks");
                continue;
            };
            if let Some(name) = self.add_node(standard, expanding, element, &candidate)? {
                self.schema.record_method_name(element, candidate.key, &name);
            }
        }
        Ok(())
    }

    /// Applies substitutions, exclusions and multiplicity overrides.
    fn candidate<'p>(&self, owner: &str, property: &'p PropertyInfo) -> Option<Candidate<'p>> {
        let lookup = (owner.to_string(), property.key.clone());
        let (ty, substituted) = match self.substitutions.get(&lookup) {
            Some(None) => return None,
            Some(Some(ty)) => (ty.clone(), true),
            None => (property.value_type.clone(), false),
        };
        if ty
            .exclusion_name()
            .is_some_and(|name| self.excluded.contains(name))
        {
            return None;
        }

        let mut max = if property.collection { None } else { Some(1) };
        if substituted && property.collection && matches!(ty, TypeRef::Array(_)) {
            max = Some(1);
        }
        match self.multiplicities.get(&lookup) {
            Some(Multiplicity::Collection) => max = None,
            Some(Multiplicity::Singleton) => max = Some(1),
            None => {}
        }
        let repeated = max.is_none_or(|max| max > 1);

        Some(Candidate {
            key: &property.key,
            name: property.tree_name(),
            ty,
            min: u32::from(property.obligation == Obligation::Mandatory),
            max: if property.obligation == Obligation::Forbidden {
                Some(0)
            } else {
                max
            },
            repeated,
            range: property.range.as_ref(),
            description: property.description.as_deref(),
        })
    }

    /// Child policy from the obligations of element-producing properties.
    ///
    /// Properties removed by exclusion or substitution do not take part.
    fn infer_policy(&self, standard: &dyn MetadataStandard, type_name: &str) -> ChildPolicy {
        let mut obligations = HashSet::new();
        for property in standard.properties(type_name) {
            let Some(candidate) = self.candidate(type_name, property) else {
                continue;
            };
            let element = match &candidate.ty {
                TypeRef::Structured(name) => standard.is_metadata(name),
                TypeRef::Array(_) => candidate.repeated,
                _ => false,
            };
            if element {
                obligations.insert(property.obligation);
            }
        }
        let mut iter = obligations.into_iter();
        match (iter.next(), iter.next()) {
            (Some(Obligation::Mandatory), None) => ChildPolicy::All,
            (Some(Obligation::Conditional), None) => ChildPolicy::Choice,
            (Some(Obligation::Forbidden), None) => ChildPolicy::Empty,
            _ => ChildPolicy::Some,
        }
    }

    /// Links `name` under `parent` if it already exists for the same type.
    ///
    /// Returns `Ok(false)` when no element of that name exists yet.
    fn link_existing(
        &mut self,
        parent: &str,
        name: &str,
        type_name: Option<&str>,
        repeated: bool,
    ) -> Result<bool> {
        let Some(node) = self.schema.element(name) else {
            return Ok(false);
        };
        let existing_repeated = node.policy() == ChildPolicy::Repeat;
        let origin = if existing_repeated {
            self.schema.repeat_component(name).and_then(|c| c.origin.as_ref())
        } else {
            node.origin.as_ref()
        };
        let existing_type = origin.map(|o| o.type_name.clone());

        if existing_repeated != repeated || existing_type.as_deref() != type_name {
            let describe = |ty: Option<&str>, repeated: bool| {
                let ty = ty.unwrap_or("array");
                if repeated { format!("{ty}[]") } else { ty.to_string() }
            };
            return Err(SchemaError::SchemaConflict {
                name: name.to_string(),
                existing: describe(existing_type.as_deref(), existing_repeated),
                requested: describe(type_name, repeated),
            });
        }
        debug!(parent, element = name, "Linking existing element");
        self.schema.add_existing_element(parent, name)?;
        Ok(true)
    }
}

/// Bounds of an attribute: list bounds for lists, presence otherwise.
fn attribute_bounds(candidate: &Candidate<'_>, list: bool) -> Cardinality {
    if list && candidate.repeated {
        Cardinality::new(candidate.min, candidate.max)
    } else {
        Cardinality::new(candidate.min.min(1), Some(1))
    }
}

/// Name of the singular component of a repeated element.
///
/// Uses the type identifier when it differs from the container name, else
/// the container name without its plural `s`, else the container name with
/// an `Entry` suffix.
///
/// # Examples
///
/// ```
/// use metatree_builder::component_name;
///
/// assert_eq!(component_name("bands", Some("SampleDimension")), "SampleDimension");
/// assert_eq!(component_name("axes", None), "axe");
/// assert_eq!(component_name("Band", Some("Band")), "BandEntry");
/// ```
pub fn component_name(container: &str, type_identifier: Option<&str>) -> String {
    if let Some(identifier) = type_identifier {
        if !identifier.is_empty() && identifier != container {
            return identifier.to_string();
        }
    }
    match container.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => format!("{container}Entry"),
    }
}

#[cfg(test)]
mod tests {
    use crate::standard::{StaticStandard, TypeInfo};

    use super::*;

    fn ty(text: &str) -> TypeRef {
        text.parse().unwrap()
    }

    #[test]
    fn test_policy_from_uniform_obligations() {
        let standard = StaticStandard::new("t")
            .with_type(
                "Outer",
                TypeInfo::new()
                    .with_property(PropertyInfo::new("first", ty("Inner")).mandatory())
                    .with_property(PropertyInfo::new("second", ty("Inner2")).mandatory())
                    .with_property(PropertyInfo::new("note", ty("string"))),
            )
            .with_type("Inner", TypeInfo::new())
            .with_type("Inner2", TypeInfo::new());
        let mut builder = SchemaBuilder::new(Schema::new("t", "Root"));
        builder.build(&standard, "Outer", "outer", None, false).unwrap();
        assert_eq!(builder.schema().element("outer").unwrap().policy(), ChildPolicy::All);
        assert_eq!(builder.schema().element("first").unwrap().cardinality, Cardinality::MANDATORY);
    }

    #[test]
    fn test_mixed_obligations_fall_back_to_some() {
        let standard = StaticStandard::new("t")
            .with_type(
                "Outer",
                TypeInfo::new()
                    .with_property(PropertyInfo::new("first", ty("Inner")).mandatory())
                    .with_property(
                        PropertyInfo::new("second", ty("Inner2")).with_obligation(Obligation::Conditional),
                    ),
            )
            .with_type("Inner", TypeInfo::new())
            .with_type("Inner2", TypeInfo::new());
        let mut builder = SchemaBuilder::new(Schema::new("t", "Root"));
        builder.build(&standard, "Outer", "outer", None, false).unwrap();
        assert_eq!(builder.schema().element("outer").unwrap().policy(), ChildPolicy::Some);
    }

    #[test]
    fn test_forbidden_children_yield_empty_policy() {
        let standard = StaticStandard::new("t")
            .with_type(
                "Outer",
                TypeInfo::new()
                    .with_property(
                        PropertyInfo::new("hidden", ty("Inner")).with_obligation(Obligation::Forbidden),
                    )
                    .with_property(PropertyInfo::new("label", ty("string"))),
            )
            .with_type("Inner", TypeInfo::new());
        let mut builder = SchemaBuilder::new(Schema::new("t", "Root"));
        builder.build(&standard, "Outer", "outer", None, false).unwrap();
        let schema = builder.finish();
        let outer = schema.element("outer").unwrap();
        assert_eq!(outer.policy(), ChildPolicy::Empty);
        assert!(outer.children.is_empty());
        assert!(!schema.contains("hidden"));
        assert!(schema.attribute("outer", "label").is_some());
    }

    #[test]
    fn test_substituted_to_none_does_not_count() {
        let standard = StaticStandard::new("t")
            .with_type(
                "Outer",
                TypeInfo::new()
                    .with_property(PropertyInfo::new("first", ty("Inner")).mandatory())
                    .with_property(PropertyInfo::new("extra", ty("Inner2"))),
            )
            .with_type("Inner", TypeInfo::new())
            .with_type("Inner2", TypeInfo::new());
        let mut builder =
            SchemaBuilder::new(Schema::new("t", "Root")).substitute("Outer", "extra", None);
        builder.build(&standard, "Outer", "outer", None, false).unwrap();
        let schema = builder.finish();
        assert_eq!(schema.element("outer").unwrap().policy(), ChildPolicy::All);
        assert!(!schema.contains("extra"));
    }

    #[test]
    fn test_optional_boolean_gets_default() {
        let standard = StaticStandard::new("t").with_type(
            "Flags",
            TypeInfo::new()
                .with_property(PropertyInfo::new("visible", ty("boolean")))
                .with_property(PropertyInfo::new("required", ty("boolean")).mandatory()),
        );
        let mut builder = SchemaBuilder::new(Schema::new("t", "Root"));
        builder.build(&standard, "Flags", "flags", None, false).unwrap();
        let schema = builder.finish();
        assert_eq!(
            schema.attribute("flags", "visible").unwrap().default_value,
            Some(Value::Boolean(false))
        );
        assert_eq!(schema.attribute("flags", "required").unwrap().default_value, None);
    }

    #[test]
    fn test_range_with_enumeration_is_ambiguous() {
        let standard = StaticStandard::new("t")
            .with_type(
                "Axis",
                TypeInfo::new().with_property(
                    PropertyInfo::new("direction", ty("enum:Direction"))
                        .with_range(NumberRange::new(Some(0.0), Some(1.0))),
                ),
            )
            .with_enumeration("Direction", &["up", "down"]);
        let mut builder = SchemaBuilder::new(Schema::new("t", "Root"));
        let err = builder.build(&standard, "Axis", "axis", None, false).unwrap_err();
        assert!(matches!(err, SchemaError::AmbiguousSchema { .. }));
    }

    #[test]
    fn test_attribute_name_clash_uses_key() {
        let standard = StaticStandard::new("t").with_type(
            "Thing",
            TypeInfo::new()
                .with_property(PropertyInfo::new("name", ty("string")))
                .with_property(PropertyInfo::new("alias", ty("string")).with_identifier("name")),
        );
        let mut builder = SchemaBuilder::new(Schema::new("t", "Root"));
        builder.build(&standard, "Thing", "thing", None, false).unwrap();
        let schema = builder.finish();
        assert_eq!(schema.method_name("thing", "name"), Some("name"));
        assert_eq!(schema.method_name("thing", "alias"), Some("alias"));
    }

    #[test]
    fn test_unknown_root_type() {
        let standard = StaticStandard::new("t");
        let mut builder = SchemaBuilder::new(Schema::new("t", "Root"));
        assert_eq!(
            builder.build(&standard, "Nothing", "nothing", None, false),
            Err(SchemaError::UnknownNode("t:Nothing".to_string()))
        );
    }
}
