//! HTTP headers abstraction for [`HttpRequest`](crate::http::request::HttpRequest)
//!
//! This module provides the header store of a request. Header names are
//! case-insensitive and treat `_` and `-` as the same separator, so the
//! environment form `CONTENT_TYPE` and the wire form `Content-Type` address
//! one entry. The normalized name (lower case, `-` separated) is the only key
//! kept internally.
//!
//! Each header maps to an ordered list of values. Setting a header that
//! already exists appends to its list instead of replacing it, which is how
//! repeated header lines accumulate.
//!
//! Headers are stored in an ordered map to preserve insertion order.
//! No validation is performed on the values themselves.

use std::fmt;

use indexmap::IndexMap;

use crate::filter::SharedFilter;
use crate::http::value::Value;

/// Anything that can be stored as one or more header values.
///
/// A single string appends one value, a sequence appends all of its
/// elements in order.
pub trait IntoHeaderValues {
    fn into_header_values(self) -> Vec<String>;
}

impl IntoHeaderValues for &str {
    fn into_header_values(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoHeaderValues for String {
    fn into_header_values(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoHeaderValues for &String {
    fn into_header_values(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl<S: Into<String>> IntoHeaderValues for Vec<S> {
    fn into_header_values(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<S: Into<String>, const N: usize> IntoHeaderValues for [S; N] {
    fn into_header_values(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl IntoHeaderValues for &[&str] {
    fn into_header_values(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

/// Lower-cases `name` and folds `_` into `-`.
pub fn normalize_name(name: &str) -> String {
    name.to_ascii_lowercase().replace('_', "-")
}

pub struct HttpHeaders {
    filter: SharedFilter,
    headers: IndexMap<String, Vec<String>>,
}

impl HttpHeaders {
    pub fn new<I, K, V>(filter: SharedFilter, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoHeaderValues,
    {
        let mut store = Self {
            filter,
            headers: IndexMap::new(),
        };
        store.add(headers);
        store
    }

    /// Number of distinct normalized header names.
    pub fn count(&self) -> usize {
        self.headers.len()
    }

    pub fn all(&self) -> &IndexMap<String, Vec<String>> {
        &self.headers
    }

    /// Calls [`HttpHeaders::set`] once per pair, so existing values accumulate.
    pub fn add<I, K, V>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoHeaderValues,
    {
        for (name, values) in headers {
            self.set(name.as_ref(), values);
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.headers.contains_key(&normalize_name(name))
    }

    /// Returns the values of a header, or an empty slice when it is not set.
    pub fn get(&self, name: &str) -> &[String] {
        self.headers
            .get(&normalize_name(name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the values of a header, or `[default]` when it is not set.
    pub fn get_or(&self, name: &str, default: &str) -> Vec<String> {
        match self.headers.get(&normalize_name(name)) {
            Some(values) => values.clone(),
            None => vec![default.to_string()],
        }
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).first().map(String::as_str)
    }

    /// Values of a header joined the way they would be folded onto one line.
    pub fn line(&self, name: &str) -> Option<String> {
        let values = self.get(name);
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    /// Appends `values` to the header. Prior values are never replaced.
    pub fn set(&mut self, name: &str, values: impl IntoHeaderValues) {
        let values = values.into_header_values();
        let key = normalize_name(name);
        match self.headers.get_mut(&key) {
            Some(existing) => existing.extend(values),
            None if values.is_empty() => {}
            None => {
                self.headers.insert(key, values);
            }
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.headers.shift_remove(&normalize_name(name));
    }

    /// Returns the header's values, or `[default]` when absent, passed through
    /// the request's filter as a list.
    pub fn filter(&self, name: &str, default: Option<&str>, spec: &str) -> Value {
        let values = match default {
            Some(default) => self.get_or(name, default),
            None => self.get(name).to_vec(),
        };
        self.filter.clean(Value::from(values), spec)
    }
}

impl fmt::Debug for HttpHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpHeaders")
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::InputFilter;

    fn empty() -> HttpHeaders {
        HttpHeaders::new(InputFilter::shared(), Vec::<(&str, &str)>::new())
    }

    #[test]
    fn names_are_normalized() {
        let mut headers = empty();
        headers.set("Content_Type", "text/html");
        headers.set("content-type", "text/plain");

        assert_eq!(headers.count(), 1);
        assert!(headers.exists("CONTENT-TYPE"));
        assert_eq!(headers.get("Content-Type"), ["text/html", "text/plain"]);
        assert_eq!(headers.all().keys().collect::<Vec<_>>(), ["content-type"]);
    }

    #[test]
    fn sequences_are_appended_in_order() {
        let mut headers = empty();
        headers.set("Accept", ["a", "b"]);
        headers.set("accept", vec!["c".to_string()]);
        headers.set("ACCEPT", "d");

        assert_eq!(headers.get("accept"), ["a", "b", "c", "d"]);
    }

    #[test]
    fn missing_header_defaults() {
        let headers = empty();
        assert!(headers.get("missing").is_empty());
        assert_eq!(headers.get_or("missing", "d"), ["d"]);
        assert_eq!(headers.first("missing"), None);
        assert_eq!(headers.line("missing"), None);
    }

    #[test]
    fn empty_sequence_creates_no_entry() {
        let mut headers = empty();
        headers.set("X-Empty", Vec::<String>::new());
        assert!(!headers.exists("x-empty"));

        headers.set("X-Empty", "v");
        headers.set("X-Empty", Vec::<String>::new());
        assert_eq!(headers.get("x-empty"), ["v"]);
    }

    #[test]
    fn add_accumulates() {
        let mut headers = HttpHeaders::new(InputFilter::shared(), [("HOST", "a.test")]);
        headers.add([("host", "b.test")]);

        assert_eq!(headers.count(), 1);
        assert_eq!(headers.line("Host").as_deref(), Some("a.test, b.test"));
    }

    #[test]
    fn remove_uses_normalized_name() {
        let mut headers = HttpHeaders::new(InputFilter::shared(), [("X_FORWARDED_FOR", "1.2.3.4")]);
        headers.remove("X-Forwarded-For");
        assert_eq!(headers.count(), 0);
    }

    #[test]
    fn filter_returns_a_list() {
        let headers = HttpHeaders::new(InputFilter::shared(), [("X_ID", "12a")]);
        assert_eq!(headers.filter("x-id", None, "int"), Value::List(vec![Value::Int(12)]));
        assert_eq!(
            headers.filter("x-missing", Some("7"), "int"),
            Value::List(vec![Value::Int(7)])
        );
        assert_eq!(headers.filter("x-missing", None, "int"), Value::List(Vec::new()));
    }
}
