//! Typed attribute values.
//!
//! Attribute payloads are stored as text in the document tree. [`Value`] is
//! the decoded form produced by the [`coder`](crate::coder) and
//! [`ValueKind`] tells the coder which grammar to apply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Grammar selector for decoding attribute text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    String,
    Integer,
    Float,
    Double,
    Boolean,
    /// `yyyy-MM-dd HH:mm:ss` in UTC.
    Date,
    /// Numeric range such as `[0 .. 255]`.
    Range,
    /// Unit of measurement symbol.
    Unit,
    /// One of the listed code names.
    Enumeration(Vec<String>),
    /// `[AUTHORITY:]code` identifier.
    Identifier,
    /// Whitespace-separated sequence of the inner kind.
    List(Box<ValueKind>),
}

impl ValueKind {
    /// Short name used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::Boolean => "boolean",
            ValueKind::Date => "date",
            ValueKind::Range => "range",
            ValueKind::Unit => "unit",
            ValueKind::Enumeration(_) => "enumeration",
            ValueKind::Identifier => "identifier",
            ValueKind::List(_) => "list",
        }
    }
}

/// A decoded attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    Range(NumberRange),
    Unit(Unit),
    /// Canonical name of an enumeration member.
    Code(String),
    Identifier(Identifier),
    List(Vec<Value>),
}

impl Value {
    /// Short name of the variant, used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Boolean(_) => "boolean",
            Value::Date(_) => "date",
            Value::Range(_) => "range",
            Value::Unit(_) => "unit",
            Value::Code(_) => "enumeration",
            Value::Identifier(_) => "identifier",
            Value::List(_) => "list",
        }
    }

    /// Returns the value as a double if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }
}

/// Numeric range with per-bound inclusivity and an optional unit.
///
/// # Examples
///
/// ```
/// use metatree_core::NumberRange;
///
/// let range = NumberRange::new(Some(0.0), Some(255.0));
/// assert!(range.contains(0.0));
/// assert!(range.contains(255.0));
///
/// let open = NumberRange::new(Some(0.0), None).exclusive_min();
/// assert!(!open.contains(0.0));
/// assert!(open.contains(1e300));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberRange {
    /// Lower bound, `None` for unbounded.
    pub min: Option<f64>,
    pub min_inclusive: bool,
    /// Upper bound, `None` for unbounded.
    pub max: Option<f64>,
    pub max_inclusive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
}

impl NumberRange {
    /// Creates a range with both bounds inclusive.
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            min,
            min_inclusive: true,
            max,
            max_inclusive: true,
            unit: None,
        }
    }

    pub fn exclusive_min(mut self) -> Self {
        self.min_inclusive = false;
        self
    }

    pub fn exclusive_max(mut self) -> Self {
        self.max_inclusive = false;
        self
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Returns `true` if `value` lies within the bounds.
    pub fn contains(&self, value: f64) -> bool {
        let above = match self.min {
            Some(min) if self.min_inclusive => value >= min,
            Some(min) => value > min,
            None => true,
        };
        let below = match self.max {
            Some(max) if self.max_inclusive => value <= max,
            Some(max) => value < max,
            None => true,
        };
        above && below
    }
}

/// Unit of measurement, stored by symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit(String);

impl Unit {
    /// Parses a unit symbol such as `m`, `km/s` or `°`.
    ///
    /// # Examples
    ///
    /// ```
    /// use metatree_core::Unit;
    ///
    /// assert_eq!(Unit::parse("m/s").unwrap().symbol(), "m/s");
    /// assert!(Unit::parse("metre per second").is_err());
    /// ```
    pub fn parse(symbol: &str) -> Result<Self, crate::DecodeError> {
        crate::coder::decode_unit(symbol)
    }

    pub(crate) fn from_checked(symbol: &str) -> Self {
        Self(symbol.to_string())
    }

    pub fn symbol(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier in `[AUTHORITY:]code` form.
///
/// # Examples
///
/// ```
/// use metatree_core::Identifier;
///
/// let id = Identifier::new(Some("EPSG"), "4326");
/// assert_eq!(id.to_string(), "EPSG:4326");
/// assert_eq!(Identifier::new(None, "WGS84").to_string(), "WGS84");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
    pub code: String,
}

impl Identifier {
    pub fn new(authority: Option<&str>, code: &str) -> Self {
        Self {
            authority: authority.map(String::from),
            code: code.to_string(),
        }
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.authority {
            Some(authority) => write!(f, "{authority}:{}", self.code),
            None => f.write_str(&self.code),
        }
    }
}
