//! Typed, read-only view of an incoming CGI request.
//!
//! [`HttpRequest`] groups one store per data source (query string, body,
//! attributes, cookies, server environment) and a header store rebuilt from
//! the environment, including the `Authorization` header that CGI gateways
//! only expose indirectly.

pub mod cgi;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;

pub use error::{ConfigError, RequestError};
pub use filter::{Clean, InputFilter};
pub use http::{HttpHeaders, HttpRequest, ParameterStore, RequestParts, ServerEnvironment, Value};
