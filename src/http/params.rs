//! Key/value storage for one source of request data.
//!
//! A [`ParameterStore`] holds the parameters of a single source (query string,
//! form body, cookies, custom attributes or the server environment). Keys are
//! case-sensitive and unique; setting an existing key replaces its value.
//!
//! Lookups never fail: a missing key is reported as `None` by [`ParameterStore::get`]
//! or resolved to the caller's default by [`ParameterStore::get_or`].

use std::fmt;

use indexmap::IndexMap;

use crate::filter::SharedFilter;
use crate::http::value::Value;

pub struct ParameterStore<V = Value> {
    filter: SharedFilter,
    parameters: IndexMap<String, V>,
}

impl<V> ParameterStore<V> {
    pub fn new<I, K>(filter: SharedFilter, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        Self {
            filter,
            parameters: parameters.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn count(&self) -> usize {
        self.parameters.len()
    }

    pub fn all(&self) -> &IndexMap<String, V> {
        &self.parameters
    }

    pub fn exists(&self, key: &str) -> bool {
        self.parameters.contains_key(key)
    }

    /// Returns the stored value, or `None` when the key is absent.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.parameters.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: V) {
        self.parameters.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) {
        self.parameters.shift_remove(key);
    }

    /// Merges `parameters` into the store. Later keys replace earlier ones in
    /// place; keys not mentioned are left alone.
    pub fn add<I, K>(&mut self, parameters: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        for (key, value) in parameters {
            self.set(key, value);
        }
    }
}

impl<V: Clone> ParameterStore<V> {
    pub fn get_or(&self, key: &str, default: V) -> V {
        self.parameters.get(key).cloned().unwrap_or(default)
    }
}

impl<V: Clone + Into<Value>> ParameterStore<V> {
    /// Returns `get_or(key, default)` passed through the request's filter.
    pub fn filter(&self, key: &str, default: impl Into<Value>, spec: &str) -> Value {
        let value = match self.parameters.get(key) {
            Some(v) => v.clone().into(),
            None => default.into(),
        };
        self.filter.clean(value, spec)
    }
}

impl<V: fmt::Debug> fmt::Debug for ParameterStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterStore")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::InputFilter;

    fn store(pairs: &[(&str, Value)]) -> ParameterStore {
        ParameterStore::new(InputFilter::shared(), pairs.iter().cloned())
    }

    #[test]
    fn missing_key_uses_default() {
        let params = store(&[("a", Value::Int(1))]);
        assert_eq!(params.get("b"), None);
        assert_eq!(params.get_or("b", Value::from("fallback")), Value::from("fallback"));
        assert_eq!(params.get_or("a", Value::Null), Value::Int(1));
    }

    #[test]
    fn null_is_a_present_value() {
        let params = store(&[("a", Value::Null)]);
        assert!(params.exists("a"));
        assert_eq!(params.get("a"), Some(&Value::Null));
        assert_eq!(params.get_or("a", Value::Int(5)), Value::Null);
    }

    #[test]
    fn keys_are_case_sensitive() {
        let params = store(&[("Key", Value::Int(1))]);
        assert!(params.exists("Key"));
        assert!(!params.exists("key"));
    }

    #[test]
    fn add_overwrites_conflicts_and_keeps_the_rest() {
        let mut params = store(&[("a", Value::Int(1)), ("b", Value::Int(2))]);
        params.add([("b", Value::Int(20)), ("c", Value::Int(3))]);

        assert_eq!(params.count(), 3);
        assert_eq!(params.get("a"), Some(&Value::Int(1)));
        assert_eq!(params.get("b"), Some(&Value::Int(20)));
        assert_eq!(params.all().keys().collect::<Vec<_>>(), ["a", "b", "c"]);
    }

    #[test]
    fn set_replaces_and_remove_deletes() {
        let mut params = store(&[]);
        params.set("a", Value::Int(1));
        params.set("a", Value::Int(2));
        assert_eq!(params.count(), 1);
        assert_eq!(params.get("a"), Some(&Value::Int(2)));

        params.remove("a");
        params.remove("never-there");
        assert_eq!(params.count(), 0);
    }

    #[test]
    fn filter_cleans_stored_or_default_value() {
        let params = store(&[("task", Value::from("article.save<x>"))]);
        assert_eq!(params.filter("task", Value::Null, "cmd"), Value::from("article.savex"));
        assert_eq!(params.filter("id", "12abc", "int"), Value::Int(12));
    }

    #[test]
    fn string_stores_filter_through_value() {
        let env: ParameterStore<String> =
            ParameterStore::new(InputFilter::shared(), [("PORT", "8080".to_string())]);
        assert_eq!(env.filter("PORT", Value::Null, "uint"), Value::Int(8080));
    }
}
