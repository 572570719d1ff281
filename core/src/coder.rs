//! Textual coding of attribute values.
//!
//! Every attribute payload in a document is text. This module converts
//! between that text and [`Value`]s using fixed, locale-independent
//! grammars:
//!
//! - numbers use the Rust literal grammar (`.` decimal separator, no
//!   grouping);
//! - booleans accept `true|yes|on` and `false|no|off`, ignoring case;
//! - dates use `yyyy-MM-dd HH:mm:ss` in UTC;
//! - lists are whitespace-separated tokens. A space inside one token is
//!   written as [`SPACE_PLACEHOLDER`] so it never collides with the
//!   separator.
//!
//! Empty or all-whitespace text decodes to `None` ("no value").
//! Surrounding whitespace is never significant: decoding trims text and list
//! items, and encoding drops list items whose text is empty. A string list
//! containing `""` or `" a "` therefore reads back without the empty item
//! and with `"a"`.
//!
//! # Example
//!
//! ```
//! use metatree_core::{Value, ValueKind, coder};
//!
//! let kind = ValueKind::List(Box::new(ValueKind::Double));
//! let value = coder::decode("1 2.5 -3", &kind).unwrap().unwrap();
//! assert_eq!(
//!     value,
//!     Value::List(vec![Value::Double(1.0), Value::Double(2.5), Value::Double(-3.0)])
//! );
//! assert_eq!(coder::encode(&value), "1 2.5 -3");
//! assert_eq!(coder::decode("   ", &kind).unwrap(), None);
//! ```

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::error::DecodeError;
use crate::value::{Identifier, NumberRange, Unit, Value, ValueKind};

/// Separator between list items.
pub const LIST_SEPARATOR: char = ' ';

/// Stand-in for a space embedded in a single list item (no-break space).
pub const SPACE_PLACEHOLDER: char = '\u{00A0}';

/// `chrono` pattern of the canonical date form.
pub const DATE_PATTERN: &str = "%Y-%m-%d %H:%M:%S";

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\[(])\s*(\S*?)\s*(?:\.\.|…)\s*([^\s\])]*)\s*([\])])\s*(\S*)$")
        .expect("static regex must compile")
});

static UNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[\p{L}\p{N}°%'"/·*^.\-_]+$"#).expect("static regex must compile")
});

/// Decodes `text` according to `kind`.
///
/// Returns `Ok(None)` for empty or all-whitespace text.
///
/// # Errors
///
/// Returns a [`DecodeError`] when non-empty text does not match the grammar
/// of `kind`. Plain strings never fail.
pub fn decode(text: &str, kind: &ValueKind) -> Result<Option<Value>, DecodeError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    match kind {
        ValueKind::List(item) => decode_list(text, item).map(Some),
        _ => decode_scalar(text, kind).map(Some),
    }
}

/// Encodes `value` to its canonical text.
///
/// # Examples
///
/// ```
/// use metatree_core::{Value, coder};
///
/// let names = Value::List(vec![Value::String("New York".into()), Value::String("Paris".into())]);
/// assert_eq!(coder::encode(&names), "New\u{a0}York Paris");
/// assert_eq!(coder::encode(&Value::Boolean(true)), "true");
/// ```
pub fn encode(value: &Value) -> String {
    match value {
        Value::List(items) => items
            .iter()
            .map(encode_item)
            .filter(|token| !token.is_empty())
            .collect::<Vec<_>>()
            .join(&LIST_SEPARATOR.to_string()),
        other => encode_scalar(other),
    }
}

fn encode_item(value: &Value) -> String {
    encode(value)
        .trim()
        .replace(LIST_SEPARATOR, &SPACE_PLACEHOLDER.to_string())
}

fn encode_scalar(value: &Value) -> String {
    match value {
        Value::String(s) | Value::Code(s) => s.clone(),
        Value::Integer(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Boolean(v) => v.to_string(),
        Value::Date(d) => d.format(DATE_PATTERN).to_string(),
        Value::Range(range) => encode_range(range),
        Value::Unit(unit) => unit.to_string(),
        Value::Identifier(id) => id.to_string(),
        Value::List(_) => encode(value),
    }
}

fn encode_range(range: &NumberRange) -> String {
    let open = if range.min_inclusive { '[' } else { '(' };
    let close = if range.max_inclusive { ']' } else { ')' };
    let min = range
        .min
        .map_or_else(|| "-inf".to_string(), |v| v.to_string());
    let max = range.max.map_or_else(|| "inf".to_string(), |v| v.to_string());
    match &range.unit {
        Some(unit) => format!("{open}{min} .. {max}{close} {unit}"),
        None => format!("{open}{min} .. {max}{close}"),
    }
}

fn decode_list(text: &str, item: &ValueKind) -> Result<Value, DecodeError> {
    if matches!(item, ValueKind::List(_)) {
        return Err(DecodeError::NestedList);
    }
    let mut values = Vec::new();
    // The placeholder is Unicode whitespace, so split on ASCII only.
    for token in text.split_ascii_whitespace() {
        let token = token.replace(SPACE_PLACEHOLDER, &LIST_SEPARATOR.to_string());
        values.push(decode_scalar(token.trim(), item)?);
    }
    Ok(Value::List(values))
}

fn decode_scalar(text: &str, kind: &ValueKind) -> Result<Value, DecodeError> {
    match kind {
        ValueKind::String => Ok(Value::String(text.to_string())),
        ValueKind::Integer => decode_integer(text).map(Value::Integer),
        ValueKind::Float => text
            .parse::<f32>()
            .map(Value::Float)
            .map_err(|_| not_a_number(text, kind)),
        ValueKind::Double => text
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| not_a_number(text, kind)),
        ValueKind::Boolean => decode_boolean(text).map(Value::Boolean),
        ValueKind::Date => NaiveDateTime::parse_from_str(text, DATE_PATTERN)
            .map(|d| Value::Date(d.and_utc()))
            .map_err(|_| DecodeError::NotADate(text.to_string())),
        ValueKind::Range => decode_range(text).map(Value::Range),
        ValueKind::Unit => decode_unit(text).map(Value::Unit),
        ValueKind::Enumeration(codes) => find_code(codes, text)
            .map(|i| Value::Code(codes[i].clone()))
            .ok_or_else(|| DecodeError::UnknownCode {
                text: text.to_string(),
                allowed: codes.clone(),
            }),
        ValueKind::Identifier => decode_identifier(text).map(Value::Identifier),
        ValueKind::List(item) => decode_list(text, item),
    }
}

fn not_a_number(text: &str, kind: &ValueKind) -> DecodeError {
    DecodeError::NotANumber {
        text: text.to_string(),
        kind: kind.label(),
    }
}

fn decode_integer(text: &str) -> Result<i64, DecodeError> {
    if let Ok(v) = text.parse::<i64>() {
        return Ok(v);
    }
    // Accept integral decimals such as "5.0".
    match text.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v.abs() < 9.007_199_254_740_992e15 => Ok(v as i64),
        _ => Err(not_a_number(text, &ValueKind::Integer)),
    }
}

fn decode_boolean(text: &str) -> Result<bool, DecodeError> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Ok(true),
        "false" | "no" | "off" => Ok(false),
        _ => Err(DecodeError::NotABoolean(text.to_string())),
    }
}

fn decode_range(text: &str) -> Result<NumberRange, DecodeError> {
    let invalid = || DecodeError::InvalidRange(text.to_string());
    let caps = RANGE_RE.captures(text).ok_or_else(invalid)?;
    let bound = |s: &str, unbounded: &[&str]| -> Result<Option<f64>, DecodeError> {
        if s.is_empty() || unbounded.contains(&s) {
            return Ok(None);
        }
        s.parse::<f64>().map(Some).map_err(|_| invalid())
    };
    let min = bound(&caps[2], &["-inf", "-∞"])?;
    let max = bound(&caps[3], &["inf", "+inf", "∞"])?;
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            return Err(invalid());
        }
    }
    let unit = match &caps[5] {
        "" => None,
        symbol => Some(decode_unit(symbol)?),
    };
    Ok(NumberRange {
        min,
        min_inclusive: &caps[1] == "[",
        max,
        max_inclusive: &caps[4] == "]",
        unit,
    })
}

pub(crate) fn decode_unit(text: &str) -> Result<Unit, DecodeError> {
    let symbol = text.trim();
    if UNIT_RE.is_match(symbol) {
        Ok(Unit::from_checked(symbol))
    } else {
        Err(DecodeError::InvalidUnit(text.to_string()))
    }
}

fn decode_identifier(text: &str) -> Result<Identifier, DecodeError> {
    match text.split_once(':') {
        Some((authority, code)) => {
            let (authority, code) = (authority.trim(), code.trim());
            if authority.is_empty() || code.is_empty() {
                return Err(DecodeError::InvalidIdentifier(text.to_string()));
            }
            Ok(Identifier::new(Some(authority), code))
        }
        None => Ok(Identifier::new(None, text)),
    }
}

/// Finds the position of `text` in `codes`, ignoring case, spaces, `_` and `-`.
///
/// # Examples
///
/// ```
/// use metatree_core::coder::find_code;
///
/// let codes = vec!["rowMajor".to_string(), "columnMajor".to_string()];
/// assert_eq!(find_code(&codes, "COLUMN_MAJOR"), Some(1));
/// assert_eq!(find_code(&codes, "diagonal"), None);
/// ```
pub fn find_code<S: AsRef<str>>(codes: &[S], text: &str) -> Option<usize> {
    let wanted = normalize_code(text);
    codes
        .iter()
        .position(|code| normalize_code(code.as_ref()) == wanted)
}

fn normalize_code(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '_' | '-') && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn roundtrip(value: Value, kind: ValueKind) {
        let text = encode(&value);
        assert_eq!(decode(&text, &kind).unwrap(), Some(value), "text: {text:?}");
    }

    #[test]
    fn test_boolean_literals() {
        for yes in ["true", "YES", "On"] {
            assert_eq!(decode(yes, &ValueKind::Boolean).unwrap(), Some(Value::Boolean(true)));
        }
        for no in ["false", "no", "OFF"] {
            assert_eq!(decode(no, &ValueKind::Boolean).unwrap(), Some(Value::Boolean(false)));
        }
        assert_eq!(
            decode("maybe", &ValueKind::Boolean),
            Err(DecodeError::NotABoolean("maybe".to_string()))
        );
    }

    #[test]
    fn test_blank_is_absent() {
        assert_eq!(decode("", &ValueKind::Integer).unwrap(), None);
        assert_eq!(decode(" \t\n", &ValueKind::Date).unwrap(), None);
    }

    #[test]
    fn test_strings_never_fail() {
        assert_eq!(
            decode("  Mercator ", &ValueKind::String).unwrap(),
            Some(Value::String("Mercator".to_string()))
        );
    }

    #[test]
    fn test_numbers_are_locale_independent() {
        assert_eq!(decode("1.5", &ValueKind::Double).unwrap(), Some(Value::Double(1.5)));
        assert!(decode("1,5", &ValueKind::Double).is_err());
        assert_eq!(decode("42", &ValueKind::Integer).unwrap(), Some(Value::Integer(42)));
        assert_eq!(decode("7.0", &ValueKind::Integer).unwrap(), Some(Value::Integer(7)));
        assert!(matches!(
            decode("7.5", &ValueKind::Integer),
            Err(DecodeError::NotANumber { kind: "integer", .. })
        ));
    }

    #[test]
    fn test_scalar_roundtrips() {
        roundtrip(Value::Double(0.1), ValueKind::Double);
        roundtrip(Value::Double(-1.0e-300), ValueKind::Double);
        roundtrip(Value::Float(3.25), ValueKind::Float);
        roundtrip(Value::Integer(i64::MIN), ValueKind::Integer);
        roundtrip(
            Value::Date(Utc.with_ymd_and_hms(2009, 2, 13, 23, 31, 30).unwrap()),
            ValueKind::Date,
        );
        roundtrip(
            Value::Identifier(Identifier::new(Some("EPSG"), "4326")),
            ValueKind::Identifier,
        );
    }

    #[test]
    fn test_list_placeholder_roundtrip() {
        let dates = Value::List(vec![
            Value::Date(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            Value::Date(Utc.with_ymd_and_hms(2021, 6, 30, 12, 5, 9).unwrap()),
        ]);
        let text = encode(&dates);
        assert_eq!(text, "2020-01-01\u{a0}00:00:00 2021-06-30\u{a0}12:05:09");
        roundtrip(dates, ValueKind::List(Box::new(ValueKind::Date)));
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let names = Value::List(vec![
            Value::String(" north ".into()),
            Value::String(String::new()),
            Value::String("south pole".into()),
        ]);
        let text = encode(&names);
        assert_eq!(text, "north south\u{a0}pole");
        assert_eq!(
            decode(&text, &ValueKind::List(Box::new(ValueKind::String))).unwrap(),
            Some(Value::List(vec![
                Value::String("north".into()),
                Value::String("south pole".into()),
            ]))
        );
        assert_eq!(
            decode("  padded  ", &ValueKind::String).unwrap(),
            Some(Value::String("padded".into()))
        );
    }

    #[test]
    fn test_dates_reject_other_patterns() {
        assert!(decode("2020-01-01T00:00:00Z", &ValueKind::Date).is_err());
        assert!(decode("01/02/2020", &ValueKind::Date).is_err());
    }

    #[test]
    fn test_range_grammar() {
        let value = decode("[0 .. 255]", &ValueKind::Range).unwrap().unwrap();
        assert_eq!(value, Value::Range(NumberRange::new(Some(0.0), Some(255.0))));

        let open = decode("(-inf … 10) m", &ValueKind::Range).unwrap().unwrap();
        let expected = NumberRange::new(None, Some(10.0))
            .exclusive_min()
            .exclusive_max()
            .with_unit(Unit::parse("m").unwrap());
        assert_eq!(open, Value::Range(expected.clone()));
        roundtrip(Value::Range(expected), ValueKind::Range);

        assert!(decode("[5 .. 1]", &ValueKind::Range).is_err());
        assert!(decode("0 to 255", &ValueKind::Range).is_err());
    }

    #[test]
    fn test_enumeration_matches_loosely() {
        let kind = ValueKind::Enumeration(vec!["rowMajor".into(), "columnMajor".into()]);
        assert_eq!(
            decode("row_major", &kind).unwrap(),
            Some(Value::Code("rowMajor".to_string()))
        );
        assert!(matches!(decode("diagonal", &kind), Err(DecodeError::UnknownCode { .. })));
    }

    #[test]
    fn test_identifier_requires_both_parts() {
        assert!(decode(":4326", &ValueKind::Identifier).is_err());
        assert!(decode("EPSG:", &ValueKind::Identifier).is_err());
    }

    #[test]
    fn test_nested_list_rejected() {
        let kind = ValueKind::List(Box::new(ValueKind::List(Box::new(ValueKind::Integer))));
        assert_eq!(decode("1 2", &kind), Err(DecodeError::NestedList));
    }
}
