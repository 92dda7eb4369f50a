//! Request model: typed stores for each source of request data.
//!
//! # Data Flow
//! ```text
//! raw mappings (query, body, attributes, cookies, environment)
//!     → params.rs       (one ParameterStore per source)
//!     → environment.rs  (ServerEnvironment, header reconstruction)
//!     → headers.rs      (HttpHeaders built from the reconstructed map)
//!     → request.rs      (HttpRequest, lookup by precedence)
//! ```

pub mod environment;
pub mod headers;
pub mod params;
pub mod request;
pub mod status;
pub mod value;

pub use environment::{Credentials, ServerEnvironment};
pub use headers::HttpHeaders;
pub use params::ParameterStore;
pub use request::{HttpRequest, RequestParts, StoreRef};
pub use value::Value;
