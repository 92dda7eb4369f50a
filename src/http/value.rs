//! Parameter values stored in a [`ParameterStore`](crate::http::params::ParameterStore).
//!
//! Request data arriving from a query string, a form body or the caller's own
//! attributes is loosely typed: a scalar, a list of values (`a[]=1&a[]=2`) or a
//! keyed map (`a[x]=1`). [`Value`] models exactly those shapes.
//!
//! `Value::Null` is a legitimate stored value. Absence is expressed by the
//! surrounding `Option`, never by `Null`.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Renders a scalar the way it would appear in transport data.
    ///
    /// `Null` renders as an empty string and `Bool` as `"1"`/`""`. Lists and
    /// maps have no scalar form and return `None`.
    pub fn to_scalar_string(&self) -> Option<String> {
        match self {
            Value::Null => Some(String::new()),
            Value::Bool(true) => Some("1".to_string()),
            Value::Bool(false) => Some(String::new()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Str(s) => Some(s.clone()),
            Value::List(_) | Value::Map(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                write!(f, "}}")
            }
            scalar => f.write_str(&scalar.to_scalar_string().unwrap_or_default()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_maps_to_null() {
        let none: Option<&str> = None;
        assert_eq!(Value::from(none), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Str("x".to_string()));
    }

    #[test]
    fn scalar_rendering() {
        assert_eq!(Value::Int(42).to_scalar_string().as_deref(), Some("42"));
        assert_eq!(Value::Bool(true).to_scalar_string().as_deref(), Some("1"));
        assert_eq!(Value::Null.to_scalar_string().as_deref(), Some(""));
        assert!(Value::from(vec!["a"]).to_scalar_string().is_none());
    }

    #[test]
    fn display_nests_lists_and_maps() {
        let mut map = IndexMap::new();
        map.insert("k".to_string(), Value::from(vec![1, 2]));
        map.insert("n".to_string(), Value::Null);
        assert_eq!(Value::Map(map).to_string(), "{k: [1, 2], n: }");
    }

    #[test]
    fn untagged_deserialization_from_toml() {
        #[derive(Deserialize)]
        struct Doc {
            a: Value,
            b: Value,
            c: Value,
        }

        let doc: Doc = toml::from_str("a = 1\nb = \"two\"\nc = [true, 3.5]").unwrap();
        assert_eq!(doc.a, Value::Int(1));
        assert_eq!(doc.b, Value::from("two"));
        assert_eq!(doc.c, Value::List(vec![Value::Bool(true), Value::Float(3.5)]));
    }
}
