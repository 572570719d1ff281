//! Reflection surface of a metadata standard.
//!
//! The builder never inspects Rust types. It reads type descriptions through
//! the [`MetadataStandard`] trait: for each structured type, the list of its
//! properties with declared type, identifier, obligation and multiplicity.
//! [`StaticStandard`] is an in-memory implementation that can be assembled
//! in code or loaded from YAML or JSON.
//!
//! # Example YAML
//!
//! ```yaml
//! name: ISO 19115
//! types:
//!   Citation:
//!     identifier: CI_Citation
//!     properties:
//!       - key: title
//!         type: string
//!         obligation: mandatory
//!       - key: dates
//!         identifier: date
//!         type: date
//!         collection: true
//!       - key: presentationForm
//!         type: enum:PresentationForm
//! enumerations:
//!   PresentationForm: [documentDigital, imageDigital, mapDigital]
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use metatree_core::{NumberRange, PrimitiveType};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StandardError};

/// Obligation of a property in its owning type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Obligation {
    Mandatory,
    Conditional,
    Forbidden,
    /// Optional or unspecified (the default).
    #[default]
    Optional,
}

/// Declared type of a property.
///
/// The textual form used in standard files is:
///
/// | Text               | Type |
/// |--------------------|------|
/// | `string`, `integer`, `float`, `double`, `boolean` | primitive |
/// | `date`, `range`, `unit`, `identifier` | coded scalar |
/// | `enum:Name`        | enumeration declared by the standard |
/// | `T[]`              | fixed-size array of `T` |
/// | anything else      | structured type name |
///
/// # Examples
///
/// ```
/// use metatree_builder::TypeRef;
/// use metatree_core::PrimitiveType;
///
/// let ty: TypeRef = "double[]".parse().unwrap();
/// assert_eq!(ty, TypeRef::Array(Box::new(TypeRef::Primitive(PrimitiveType::Double))));
/// assert_eq!("enum:AxisDirection".parse::<TypeRef>().unwrap().to_string(), "enum:AxisDirection");
/// assert_eq!("Citation".parse::<TypeRef>().unwrap(), TypeRef::Structured("Citation".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    Primitive(PrimitiveType),
    Date,
    Range,
    Unit,
    Identifier,
    Enumeration(String),
    Array(Box<TypeRef>),
    Structured(String),
}

impl TypeRef {
    /// Returns the structured type name, if any.
    pub fn structured_name(&self) -> Option<&str> {
        match self {
            TypeRef::Structured(name) => Some(name),
            _ => None,
        }
    }

    /// Name checked against the builder's excluded types.
    pub fn exclusion_name(&self) -> Option<&str> {
        match self {
            TypeRef::Structured(name) | TypeRef::Enumeration(name) => Some(name),
            TypeRef::Array(inner) => inner.exclusion_name(),
            _ => None,
        }
    }

    /// Primitive used to store values of this type as attribute text.
    ///
    /// Coded scalars, enumerations and unknown structured types are stored as
    /// strings; arrays use their element's primitive.
    pub fn storage_primitive(&self) -> PrimitiveType {
        match self {
            TypeRef::Primitive(p) => *p,
            TypeRef::Array(inner) => inner.storage_primitive(),
            _ => PrimitiveType::String,
        }
    }
}

impl FromStr for TypeRef {
    type Err = StandardError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(inner) = s.strip_suffix("[]") {
            return Ok(TypeRef::Array(Box::new(inner.parse()?)));
        }
        if let Some(name) = s.strip_prefix("enum:") {
            if name.is_empty() {
                return Err(StandardError::InvalidType(s.to_string()));
            }
            return Ok(TypeRef::Enumeration(name.to_string()));
        }
        let ty = match s {
            "string" => TypeRef::Primitive(PrimitiveType::String),
            "integer" => TypeRef::Primitive(PrimitiveType::Integer),
            "float" => TypeRef::Primitive(PrimitiveType::Float),
            "double" => TypeRef::Primitive(PrimitiveType::Double),
            "boolean" => TypeRef::Primitive(PrimitiveType::Boolean),
            "date" => TypeRef::Date,
            "range" => TypeRef::Range,
            "unit" => TypeRef::Unit,
            "identifier" => TypeRef::Identifier,
            "" => return Err(StandardError::InvalidType(s.to_string())),
            other if other.chars().any(char::is_whitespace) => {
                return Err(StandardError::InvalidType(other.to_string()));
            }
            other => TypeRef::Structured(other.to_string()),
        };
        Ok(ty)
    }
}

impl TryFrom<String> for TypeRef {
    type Error = StandardError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(p) => f.write_str(match p {
                PrimitiveType::String => "string",
                PrimitiveType::Integer => "integer",
                PrimitiveType::Float => "float",
                PrimitiveType::Double => "double",
                PrimitiveType::Boolean => "boolean",
            }),
            TypeRef::Date => f.write_str("date"),
            TypeRef::Range => f.write_str("range"),
            TypeRef::Unit => f.write_str("unit"),
            TypeRef::Identifier => f.write_str("identifier"),
            TypeRef::Enumeration(name) => write!(f, "enum:{name}"),
            TypeRef::Array(inner) => write!(f, "{inner}[]"),
            TypeRef::Structured(name) => f.write_str(name),
        }
    }
}

/// One property of a structured type.
///
/// # Examples
///
/// ```
/// use metatree_builder::{Obligation, PropertyInfo, TypeRef};
///
/// let prop = PropertyInfo::new("dates", TypeRef::Date)
///     .with_identifier("date")
///     .collection();
/// assert_eq!(prop.tree_name(), "date");
/// assert!(prop.collection);
/// assert_eq!(prop.obligation, Obligation::Optional);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInfo {
    /// Property key, as used by getter-style accessors.
    pub key: String,
    /// UML identifier, preferred over the key when naming tree nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(rename = "type")]
    pub value_type: TypeRef,
    #[serde(default)]
    pub obligation: Obligation,
    /// Whether the property holds a collection of values.
    #[serde(default)]
    pub collection: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Valid numeric range, if the standard declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<NumberRange>,
}

impl PropertyInfo {
    /// Creates an optional, single-valued property.
    pub fn new(key: &str, value_type: TypeRef) -> Self {
        Self {
            key: key.to_string(),
            identifier: None,
            value_type,
            obligation: Obligation::Optional,
            collection: false,
            description: None,
            range: None,
        }
    }

    pub fn with_identifier(mut self, identifier: &str) -> Self {
        self.identifier = Some(identifier.to_string());
        self
    }

    pub fn with_obligation(mut self, obligation: Obligation) -> Self {
        self.obligation = obligation;
        self
    }

    /// Marks the property as mandatory.
    pub fn mandatory(self) -> Self {
        self.with_obligation(Obligation::Mandatory)
    }

    /// Marks the property as collection-valued.
    pub fn collection(mut self) -> Self {
        self.collection = true;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_range(mut self, range: NumberRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Name preferred for the tree node: the identifier, else the key.
    pub fn tree_name(&self) -> &str {
        self.identifier.as_deref().unwrap_or(&self.key)
    }
}

/// Read-only reflection over the types of a metadata standard.
pub trait MetadataStandard {
    /// Name of the standard, recorded as the origin of derived nodes.
    fn name(&self) -> &str;

    /// Returns `true` if `type_name` is a structured type of this standard.
    fn is_metadata(&self, type_name: &str) -> bool;

    /// Properties of a structured type, empty for unknown types.
    fn properties(&self, type_name: &str) -> &[PropertyInfo];

    /// UML identifier of a structured type.
    fn type_identifier(&self, type_name: &str) -> Option<&str>;

    /// Human-readable description of a structured type.
    fn type_description(&self, _type_name: &str) -> Option<&str> {
        None
    }

    /// Member names of an enumeration, `None` if unknown.
    fn code_values(&self, enumeration: &str) -> Option<&[String]>;
}

/// Description of one structured type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyInfo>,
}

impl TypeInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identifier(mut self, identifier: &str) -> Self {
        self.identifier = Some(identifier.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Adds a property.
    pub fn with_property(mut self, property: PropertyInfo) -> Self {
        self.properties.push(property);
        self
    }
}

/// In-memory metadata standard.
///
/// # Examples
///
/// ```
/// use metatree_builder::*;
///
/// let standard = StaticStandard::new("demo")
///     .with_type(
///         "Citation",
///         TypeInfo::new().with_property(PropertyInfo::new("title", "string".parse().unwrap())),
///     )
///     .with_enumeration("Direction", &["north", "south"]);
///
/// assert!(standard.is_metadata("Citation"));
/// assert_eq!(standard.properties("Citation").len(), 1);
/// assert_eq!(standard.code_values("Direction").unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticStandard {
    pub name: String,
    #[serde(default)]
    pub types: IndexMap<String, TypeInfo>,
    #[serde(default)]
    pub enumerations: IndexMap<String, Vec<String>>,
}

impl StaticStandard {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Adds a structured type.
    pub fn with_type(mut self, name: &str, info: TypeInfo) -> Self {
        self.types.insert(name.to_string(), info);
        self
    }

    /// Adds an enumeration.
    pub fn with_enumeration(mut self, name: &str, values: &[&str]) -> Self {
        self.enumerations.insert(
            name.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    /// Parses a standard from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`StandardError::Yaml`] if parsing fails.
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Parses a standard from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`StandardError::Json`] if parsing fails.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads a standard from a `.json`, `.yaml` or `.yml` file.
    ///
    /// # Errors
    ///
    /// Returns [`StandardError::Io`] if the file cannot be read,
    /// [`StandardError::UnsupportedFormat`] for other extensions, or the
    /// parse error of the detected format.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&text),
            Some("yaml" | "yml") => Self::from_yaml(&text),
            _ => Err(StandardError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Checks that every referenced structured type and enumeration exists.
    ///
    /// Structured names that are not declared are treated as opaque strings
    /// by the builder, so this is an opt-in lint rather than a requirement.
    pub fn unresolved_references(&self) -> Vec<String> {
        let mut missing = Vec::new();
        for (owner, info) in &self.types {
            for property in &info.properties {
                let mut ty = &property.value_type;
                while let TypeRef::Array(inner) = ty {
                    ty = inner;
                }
                let known = match ty {
                    TypeRef::Structured(name) => self.types.contains_key(name),
                    TypeRef::Enumeration(name) => self.enumerations.contains_key(name),
                    _ => true,
                };
                if !known {
                    missing.push(format!("{owner}.{}: {ty}", property.key));
                }
            }
        }
        missing
    }
}

impl MetadataStandard for StaticStandard {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_metadata(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    fn properties(&self, type_name: &str) -> &[PropertyInfo] {
        self.types
            .get(type_name)
            .map(|info| info.properties.as_slice())
            .unwrap_or_default()
    }

    fn type_identifier(&self, type_name: &str) -> Option<&str> {
        self.types.get(type_name)?.identifier.as_deref()
    }

    fn type_description(&self, type_name: &str) -> Option<&str> {
        self.types.get(type_name)?.description.as_deref()
    }

    fn code_values(&self, enumeration: &str) -> Option<&[String]> {
        self.enumerations.get(enumeration).map(Vec::as_slice)
    }
}
