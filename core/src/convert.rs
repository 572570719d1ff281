//! Conversions between Rust types and attribute values.
//!
//! [`FromAttribute`] names the grammar used to read a type and converts the
//! decoded [`Value`]; [`ToAttribute`] produces the value written for it.
//! `Option::None`, empty strings and empty lists all mean "no value".

use chrono::{DateTime, Utc};

use crate::error::DecodeError;
use crate::value::{Identifier, NumberRange, Unit, Value, ValueKind};

/// A type that can be read from attribute text.
pub trait FromAttribute: Sized {
    /// Grammar used to decode the attribute text.
    fn value_kind() -> ValueKind;

    /// Converts a decoded value.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::KindMismatch`] when the value has an
    /// incompatible kind, or a grammar error when a narrowing conversion
    /// fails.
    fn from_value(value: Value) -> Result<Self, DecodeError>;
}

/// A type that can be written as attribute text.
pub trait ToAttribute {
    /// Returns the value to store, `None` to remove the attribute.
    fn to_value(&self) -> Option<Value>;
}

fn mismatch(expected: &'static str, found: &Value) -> DecodeError {
    DecodeError::KindMismatch {
        expected,
        found: found.label(),
    }
}

impl FromAttribute for String {
    fn value_kind() -> ValueKind {
        ValueKind::String
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::String(s) | Value::Code(s) => Ok(s),
            other => Ok(crate::coder::encode(&other)),
        }
    }
}

impl FromAttribute for i64 {
    fn value_kind() -> ValueKind {
        ValueKind::Integer
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Integer(v) => Ok(v),
            other => Err(mismatch("integer", &other)),
        }
    }
}

macro_rules! narrow_integer {
    ($($ty:ty),+) => {
        $(
            impl FromAttribute for $ty {
                fn value_kind() -> ValueKind {
                    ValueKind::Integer
                }

                fn from_value(value: Value) -> Result<Self, DecodeError> {
                    let wide = i64::from_value(value)?;
                    <$ty>::try_from(wide).map_err(|_| DecodeError::NotANumber {
                        text: wide.to_string(),
                        kind: stringify!($ty),
                    })
                }
            }

            impl ToAttribute for $ty {
                fn to_value(&self) -> Option<Value> {
                    Some(Value::Integer(i64::from(*self)))
                }
            }
        )+
    };
}

narrow_integer!(i32, u32, i16, u16);

impl FromAttribute for f64 {
    fn value_kind() -> ValueKind {
        ValueKind::Double
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        value.as_f64().ok_or_else(|| mismatch("double", &value))
    }
}

impl FromAttribute for f32 {
    fn value_kind() -> ValueKind {
        ValueKind::Float
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Double(v) => Ok(v as f32),
            Value::Integer(v) => Ok(v as f32),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl FromAttribute for bool {
    fn value_kind() -> ValueKind {
        ValueKind::Boolean
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Boolean(v) => Ok(v),
            other => Err(mismatch("boolean", &other)),
        }
    }
}

impl FromAttribute for DateTime<Utc> {
    fn value_kind() -> ValueKind {
        ValueKind::Date
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Date(v) => Ok(v),
            other => Err(mismatch("date", &other)),
        }
    }
}

impl FromAttribute for NumberRange {
    fn value_kind() -> ValueKind {
        ValueKind::Range
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Range(v) => Ok(v),
            other => Err(mismatch("range", &other)),
        }
    }
}

impl FromAttribute for Unit {
    fn value_kind() -> ValueKind {
        ValueKind::Unit
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Unit(v) => Ok(v),
            other => Err(mismatch("unit", &other)),
        }
    }
}

impl FromAttribute for Identifier {
    fn value_kind() -> ValueKind {
        ValueKind::Identifier
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Identifier(v) => Ok(v),
            other => Err(mismatch("identifier", &other)),
        }
    }
}

impl<T: FromAttribute> FromAttribute for Vec<T> {
    fn value_kind() -> ValueKind {
        ValueKind::List(Box::new(T::value_kind()))
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            single => Ok(vec![T::from_value(single)?]),
        }
    }
}

impl ToAttribute for str {
    fn to_value(&self) -> Option<Value> {
        Some(Value::String(self.to_string()))
    }
}

impl ToAttribute for String {
    fn to_value(&self) -> Option<Value> {
        Some(Value::String(self.clone()))
    }
}

impl ToAttribute for i64 {
    fn to_value(&self) -> Option<Value> {
        Some(Value::Integer(*self))
    }
}

impl ToAttribute for f64 {
    fn to_value(&self) -> Option<Value> {
        Some(Value::Double(*self))
    }
}

impl ToAttribute for f32 {
    fn to_value(&self) -> Option<Value> {
        Some(Value::Float(*self))
    }
}

impl ToAttribute for bool {
    fn to_value(&self) -> Option<Value> {
        Some(Value::Boolean(*self))
    }
}

impl ToAttribute for DateTime<Utc> {
    fn to_value(&self) -> Option<Value> {
        Some(Value::Date(*self))
    }
}

impl ToAttribute for NumberRange {
    fn to_value(&self) -> Option<Value> {
        Some(Value::Range(self.clone()))
    }
}

impl ToAttribute for Unit {
    fn to_value(&self) -> Option<Value> {
        Some(Value::Unit(self.clone()))
    }
}

impl ToAttribute for Identifier {
    fn to_value(&self) -> Option<Value> {
        Some(Value::Identifier(self.clone()))
    }
}

impl ToAttribute for Value {
    fn to_value(&self) -> Option<Value> {
        Some(self.clone())
    }
}

impl<T: ToAttribute> ToAttribute for [T] {
    fn to_value(&self) -> Option<Value> {
        let items: Vec<Value> = self.iter().filter_map(ToAttribute::to_value).collect();
        (!items.is_empty()).then_some(Value::List(items))
    }
}

impl<T: ToAttribute, const N: usize> ToAttribute for [T; N] {
    fn to_value(&self) -> Option<Value> {
        self.as_slice().to_value()
    }
}

impl<T: ToAttribute> ToAttribute for Vec<T> {
    fn to_value(&self) -> Option<Value> {
        self.as_slice().to_value()
    }
}

impl<T: ToAttribute> ToAttribute for Option<T> {
    fn to_value(&self) -> Option<Value> {
        self.as_ref().and_then(ToAttribute::to_value)
    }
}

impl<T: ToAttribute + ?Sized> ToAttribute for &T {
    fn to_value(&self) -> Option<Value> {
        (**self).to_value()
    }
}

/// Declares an enumeration usable as an attribute value.
///
/// Each variant is bound to its code name. Decoding matches code names
/// ignoring case, spaces, `_` and `-`.
///
/// # Examples
///
/// ```
/// use metatree_core::{FromAttribute, ToAttribute, Value, ValueKind, code_list};
///
/// code_list! {
///     /// Direction of a coordinate system axis.
///     pub enum AxisDirection {
///         North => "north",
///         East => "east",
///         Up => "up",
///     }
/// }
///
/// assert_eq!(AxisDirection::East.code(), "east");
/// assert_eq!(
///     AxisDirection::from_value(Value::Code("NORTH".into())).unwrap(),
///     AxisDirection::North
/// );
/// assert!(matches!(AxisDirection::value_kind(), ValueKind::Enumeration(codes) if codes.len() == 3));
/// assert_eq!(AxisDirection::Up.to_value(), Some(Value::Code("up".into())));
/// ```
#[macro_export]
macro_rules! code_list {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $code:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Code names of all members, in declaration order.
            pub const CODES: &'static [&'static str] = &[$($code),+];
            const MEMBERS: &'static [$name] = &[$($name::$variant),+];

            /// Returns the code name of this member.
            pub fn code(&self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }

            /// Looks up a member by code name.
            pub fn from_code(code: &str) -> Option<Self> {
                $crate::coder::find_code(Self::CODES, code).map(|i| Self::MEMBERS[i])
            }
        }

        impl $crate::FromAttribute for $name {
            fn value_kind() -> $crate::ValueKind {
                $crate::ValueKind::Enumeration(Self::CODES.iter().map(|c| c.to_string()).collect())
            }

            fn from_value(value: $crate::Value) -> ::std::result::Result<Self, $crate::DecodeError> {
                match value {
                    $crate::Value::Code(text) | $crate::Value::String(text) => {
                        Self::from_code(&text).ok_or_else(|| $crate::DecodeError::UnknownCode {
                            text,
                            allowed: Self::CODES.iter().map(|c| c.to_string()).collect(),
                        })
                    }
                    other => Err($crate::DecodeError::KindMismatch {
                        expected: "enumeration",
                        found: other.label(),
                    }),
                }
            }
        }

        impl $crate::ToAttribute for $name {
            fn to_value(&self) -> Option<$crate::Value> {
                Some($crate::Value::Code(self.code().to_string()))
            }
        }
    };
}
