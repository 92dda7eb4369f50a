//! Value cleaning applied by every `filter` accessor.
//!
//! Stores never sanitize on their own; they hand the raw value and a filter
//! name to a [`Clean`] implementation shared by the whole request. The
//! bundled [`InputFilter`] understands a small vocabulary of filter names:
//!
//! | name                 | result                                           |
//! |----------------------|--------------------------------------------------|
//! | `int`, `integer`     | first signed integer found, else `0`             |
//! | `uint`               | first unsigned integer found, else `0`           |
//! | `float`, `double`    | first decimal number found, else `0.0`           |
//! | `bool`, `boolean`    | truthiness of the value                          |
//! | `word`               | only `A-Z a-z _`                                 |
//! | `alnum`              | only `A-Z a-z 0-9`                               |
//! | `cmd`                | only `A-Z a-z 0-9 . - _`, no leading `.`         |
//! | `base64`             | only `A-Z a-z 0-9 / + =`                         |
//! | `string`             | markup tags stripped                             |
//! | `trim`               | surrounding whitespace removed                   |
//! | `username`           | control chars and `< > " ' % &` removed          |
//! | `path`               | the value if it is a relative safe path, else `""` |
//! | `array`              | the value as a list                              |
//! | `raw`                | the value untouched                              |
//!
//! Lists and maps are cleaned element by element, except by `array` and `raw`.

use std::str::FromStr;
use std::sync::Arc;

use crate::http::value::Value;

/// Filter used when a caller does not name one.
pub const DEFAULT_FILTER: &str = "cmd";

/// The cleaning capability consulted by every store.
pub trait Clean: Send + Sync {
    fn clean(&self, value: Value, spec: &str) -> Value;
}

/// Handle to the cleaning capability shared by all stores of a request.
pub type SharedFilter = Arc<dyn Clean>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Int,
    Uint,
    Float,
    Bool,
    Word,
    Alnum,
    Cmd,
    Base64,
    String,
    Trim,
    Username,
    Path,
    Array,
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFilter(pub String);

impl FromStr for FilterKind {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "int" | "integer" => FilterKind::Int,
            "uint" => FilterKind::Uint,
            "float" | "double" => FilterKind::Float,
            "bool" | "boolean" => FilterKind::Bool,
            "word" => FilterKind::Word,
            "alnum" => FilterKind::Alnum,
            "cmd" => FilterKind::Cmd,
            "base64" => FilterKind::Base64,
            "string" => FilterKind::String,
            "trim" => FilterKind::Trim,
            "username" => FilterKind::Username,
            "path" => FilterKind::Path,
            "array" => FilterKind::Array,
            "raw" => FilterKind::Raw,
            _ => return Err(UnknownFilter(s.to_string())),
        };
        Ok(kind)
    }
}

/// Default [`Clean`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputFilter;

impl InputFilter {
    pub fn shared() -> SharedFilter {
        Arc::new(InputFilter)
    }

    fn clean_kind(kind: FilterKind, value: Value) -> Value {
        match (kind, value) {
            (FilterKind::Raw, value) => value,
            (FilterKind::Array, value @ (Value::List(_) | Value::Map(_))) => value,
            (FilterKind::Array, Value::Null) => Value::List(Vec::new()),
            (FilterKind::Array, value) => Value::List(vec![value]),
            (kind, Value::List(items)) => Value::List(
                items
                    .into_iter()
                    .map(|item| Self::clean_kind(kind, item))
                    .collect(),
            ),
            (kind, Value::Map(map)) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Self::clean_kind(kind, v)))
                    .collect(),
            ),
            (kind, scalar) => Self::clean_scalar(kind, scalar),
        }
    }

    fn clean_scalar(kind: FilterKind, value: Value) -> Value {
        match kind {
            FilterKind::Int => match value {
                Value::Int(i) => Value::Int(i),
                Value::Float(f) => Value::Int(f as i64),
                other => Value::Int(leading_int(&scalar(&other), true)),
            },
            FilterKind::Uint => match value {
                Value::Int(i) => Value::Int(i.saturating_abs()),
                Value::Float(f) => Value::Int((f as i64).saturating_abs()),
                other => Value::Int(leading_int(&scalar(&other), false)),
            },
            FilterKind::Float => match value {
                Value::Float(f) => Value::Float(f),
                Value::Int(i) => Value::Float(i as f64),
                other => Value::Float(leading_float(&scalar(&other))),
            },
            FilterKind::Bool => Value::Bool(truthy(&value)),
            FilterKind::Word => keep(&value, |c| c.is_ascii_alphabetic() || c == '_'),
            FilterKind::Alnum => keep(&value, |c| c.is_ascii_alphanumeric()),
            FilterKind::Cmd => {
                let kept: String = scalar(&value)
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
                    .collect();
                Value::Str(kept.trim_start_matches('.').to_string())
            }
            FilterKind::Base64 => {
                keep(&value, |c| c.is_ascii_alphanumeric() || matches!(c, '/' | '+' | '='))
            }
            FilterKind::String => Value::Str(strip_tags(&scalar(&value))),
            FilterKind::Trim => Value::Str(scalar(&value).trim().to_string()),
            FilterKind::Username => keep(&value, |c| {
                !(c.is_ascii_control() || matches!(c, '<' | '>' | '"' | '\'' | '%' | '&'))
            }),
            FilterKind::Path => {
                let path = scalar(&value);
                if is_safe_path(&path) {
                    Value::Str(path)
                } else {
                    Value::Str(String::new())
                }
            }
            // handled before reaching scalars
            FilterKind::Array | FilterKind::Raw => value,
        }
    }
}

impl Clean for InputFilter {
    fn clean(&self, value: Value, spec: &str) -> Value {
        let kind = spec.parse::<FilterKind>().unwrap_or_else(|UnknownFilter(name)| {
            tracing::warn!(filter = %name, "unknown filter, falling back to string");
            FilterKind::String
        });
        Self::clean_kind(kind, value)
    }
}

fn scalar(value: &Value) -> String {
    value.to_scalar_string().unwrap_or_default()
}

fn keep(value: &Value, allowed: impl Fn(char) -> bool) -> Value {
    Value::Str(scalar(value).chars().filter(|c| allowed(*c)).collect())
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::Str(s) => !(s.is_empty() || s == "0"),
        Value::List(items) => !items.is_empty(),
        Value::Map(map) => !map.is_empty(),
    }
}

fn leading_int(s: &str, signed: bool) -> i64 {
    let bytes = s.as_bytes();
    let Some(start) = bytes.iter().position(u8::is_ascii_digit) else {
        return 0;
    };
    let end = bytes[start..]
        .iter()
        .position(|b| !b.is_ascii_digit())
        .map_or(bytes.len(), |n| start + n);
    let magnitude = s[start..end].parse::<i64>().unwrap_or(i64::MAX);
    if signed && start > 0 && bytes[start - 1] == b'-' {
        -magnitude
    } else {
        magnitude
    }
}

fn leading_float(s: &str) -> f64 {
    let bytes = s.as_bytes();
    let Some(start) = bytes.iter().position(u8::is_ascii_digit) else {
        return 0.0;
    };
    let mut end = start;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {}
            b'.' if !seen_dot && bytes.get(end + 1).is_some_and(u8::is_ascii_digit) => {
                seen_dot = true;
            }
            _ => break,
        }
        end += 1;
    }
    let number = s[start..end].parse::<f64>().unwrap_or(0.0);
    if start > 0 && bytes[start - 1] == b'-' {
        -number
    } else {
        number
    }
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn is_safe_path(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with(['/', '\\'])
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | '\\'))
        && path.split(['/', '\\']).all(|segment| segment != "..")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(value: impl Into<Value>, spec: &str) -> Value {
        InputFilter.clean(value.into(), spec)
    }

    #[test]
    fn cmd_keeps_identifier_characters() {
        assert_eq!(clean("..com_content<script>", "cmd"), Value::from("com_contentscript"));
        assert_eq!(clean("article.edit-2", "CMD"), Value::from("article.edit-2"));
    }

    #[test]
    fn numeric_filters() {
        assert_eq!(clean("abc-42def", "int"), Value::Int(-42));
        assert_eq!(clean("abc-42def", "uint"), Value::Int(42));
        assert_eq!(clean("nothing", "int"), Value::Int(0));
        assert_eq!(clean("x3.25y", "float"), Value::Float(3.25));
        assert_eq!(clean(Value::Null, "int"), Value::Int(0));
    }

    #[test]
    fn uint_saturates_at_the_lower_bound() {
        assert_eq!(clean(Value::Int(i64::MIN), "uint"), Value::Int(i64::MAX));
        assert_eq!(clean(Value::Float(-1e300), "uint"), Value::Int(i64::MAX));
        assert_eq!(clean(Value::Float(-2.5), "uint"), Value::Int(2));
    }

    #[test]
    fn bool_follows_truthiness() {
        assert_eq!(clean("0", "bool"), Value::Bool(false));
        assert_eq!(clean("", "bool"), Value::Bool(false));
        assert_eq!(clean("yes", "bool"), Value::Bool(true));
    }

    #[test]
    fn lists_are_cleaned_element_wise() {
        let cleaned = clean(vec!["1a", "b2"], "int");
        assert_eq!(cleaned, Value::List(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn array_wraps_scalars() {
        assert_eq!(clean("x", "array"), Value::List(vec![Value::from("x")]));
        assert_eq!(clean(Value::Null, "array"), Value::List(Vec::new()));
    }

    #[test]
    fn path_rejects_traversal() {
        assert_eq!(clean("images/logo.png", "path"), Value::from("images/logo.png"));
        assert_eq!(clean("../etc/passwd", "path"), Value::from(""));
        assert_eq!(clean("/etc/passwd", "path"), Value::from(""));
    }

    #[test]
    fn unknown_filter_strips_tags() {
        assert_eq!(clean("<b>bold</b>", "no-such-filter"), Value::from("bold"));
    }

    #[test]
    fn raw_is_untouched() {
        assert_eq!(clean("<b>bold</b>", "raw"), Value::from("<b>bold</b>"));
    }
}
