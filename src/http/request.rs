use std::fmt;

use indexmap::IndexMap;

use crate::error::RequestError;
use crate::filter::SharedFilter;
use crate::http::environment::ServerEnvironment;
use crate::http::headers::HttpHeaders;
use crate::http::params::ParameterStore;
use crate::http::value::Value;

/// Raw request data, one mapping per source.
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    /// Query string parameters.
    pub query: IndexMap<String, Value>,
    /// Body parameters.
    pub request: IndexMap<String, Value>,
    /// Miscellaneous attributes supplied by the caller.
    pub attributes: IndexMap<String, Value>,
    pub cookies: IndexMap<String, Value>,
    /// Server and environment variables.
    pub server: IndexMap<String, String>,
    /// Raw body, if any.
    pub content: Option<Vec<u8>>,
}

/// A store looked up by name through [`HttpRequest::store`].
#[derive(Debug, Clone, Copy)]
pub enum StoreRef<'a> {
    Query(&'a ParameterStore),
    Request(&'a ParameterStore),
    Attributes(&'a ParameterStore),
    Cookies(&'a ParameterStore),
    Server(&'a ServerEnvironment),
    Headers(&'a HttpHeaders),
}

impl StoreRef<'_> {
    pub fn count(&self) -> usize {
        match self {
            StoreRef::Query(store)
            | StoreRef::Request(store)
            | StoreRef::Attributes(store)
            | StoreRef::Cookies(store) => store.count(),
            StoreRef::Server(server) => server.count(),
            StoreRef::Headers(headers) => headers.count(),
        }
    }

    pub fn keys(&self) -> Vec<&str> {
        match self {
            StoreRef::Query(store)
            | StoreRef::Request(store)
            | StoreRef::Attributes(store)
            | StoreRef::Cookies(store) => store.all().keys().map(String::as_str).collect(),
            StoreRef::Server(server) => server.all().keys().map(String::as_str).collect(),
            StoreRef::Headers(headers) => headers.all().keys().map(String::as_str).collect(),
        }
    }

    /// Cleans the entry under `key` with the request's filter. Absent keys
    /// clean `Null`; header entries clean as lists.
    pub fn filter(&self, key: &str, spec: &str) -> Value {
        match self {
            StoreRef::Query(store)
            | StoreRef::Request(store)
            | StoreRef::Attributes(store)
            | StoreRef::Cookies(store) => store.filter(key, Value::Null, spec),
            StoreRef::Server(server) => server.filter(key, Value::Null, spec),
            StoreRef::Headers(headers) => headers.filter(key, None, spec),
        }
    }
}

/// An incoming HTTP request as a set of read-only stores.
///
/// Every store is built once in [`HttpRequest::new`]. The header store is
/// derived from the server environment at that point and does not track
/// later changes to it.
pub struct HttpRequest {
    filter: SharedFilter,
    query: ParameterStore,
    request: ParameterStore,
    attributes: ParameterStore,
    cookies: ParameterStore,
    server: ServerEnvironment,
    headers: HttpHeaders,
    content: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(filter: SharedFilter, parts: RequestParts) -> Self {
        let mut server = ServerEnvironment::new(filter.clone(), parts.server);
        let headers = HttpHeaders::new(filter.clone(), server.headers());

        tracing::debug!(
            query = parts.query.len(),
            request = parts.request.len(),
            cookies = parts.cookies.len(),
            headers = headers.count(),
            "request assembled"
        );

        Self {
            query: ParameterStore::new(filter.clone(), parts.query),
            request: ParameterStore::new(filter.clone(), parts.request),
            attributes: ParameterStore::new(filter.clone(), parts.attributes),
            cookies: ParameterStore::new(filter.clone(), parts.cookies),
            server,
            headers,
            content: parts.content,
            filter,
        }
    }

    pub fn query(&self) -> &ParameterStore {
        &self.query
    }

    /// Body parameters.
    pub fn request(&self) -> &ParameterStore {
        &self.request
    }

    pub fn attributes(&self) -> &ParameterStore {
        &self.attributes
    }

    pub fn cookies(&self) -> &ParameterStore {
        &self.cookies
    }

    pub fn server(&self) -> &ServerEnvironment {
        &self.server
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }

    /// Looks up one of the request's stores by name.
    ///
    /// `query`, `request`, `attributes`, `cookies`, `server` and `headers`
    /// are readable. Naming other internal state is an
    /// [`AccessViolation`](RequestError::AccessViolation); any other name is
    /// reported as a warning and resolves to `None`.
    pub fn store(&self, name: &str) -> Result<Option<StoreRef<'_>>, RequestError> {
        let store = match name {
            "query" => StoreRef::Query(&self.query),
            "request" => StoreRef::Request(&self.request),
            "attributes" => StoreRef::Attributes(&self.attributes),
            "cookies" => StoreRef::Cookies(&self.cookies),
            "server" => StoreRef::Server(&self.server),
            "headers" => StoreRef::Headers(&self.headers),
            "filter" | "content" => return Err(RequestError::AccessViolation(name.to_string())),
            _ => {
                tracing::warn!(store = name, "undefined request store");
                return Ok(None);
            }
        };
        Ok(Some(store))
    }

    /// Finds `key` in the attributes, then the query, then the body.
    ///
    /// A stored `Value::Null` counts as present and stops the search.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes
            .get(key)
            .or_else(|| self.query.get(key))
            .or_else(|| self.request.get(key))
    }

    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        match self.get(key) {
            Some(value) => value.clone(),
            None => default.into(),
        }
    }

    /// [`HttpRequest::get_or`] passed through the request's filter.
    pub fn filter(&self, key: &str, default: impl Into<Value>, spec: &str) -> Value {
        self.filter.clean(self.get_or(key, default), spec)
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("query", &self.query)
            .field("request", &self.request)
            .field("attributes", &self.attributes)
            .field("cookies", &self.cookies)
            .field("server", &self.server)
            .field("headers", &self.headers)
            .field("content", &self.content.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}
