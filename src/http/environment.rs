//! Server environment of a request and header reconstruction.
//!
//! CGI-style gateways do not hand over request headers as such. Each header
//! arrives as an environment variable prefixed with `HTTP_` (`Accept-Language`
//! becomes `HTTP_ACCEPT_LANGUAGE`), except for the content metadata which
//! keeps its bare name (`CONTENT_TYPE`, `CONTENT_LENGTH`, `CONTENT_MD5`).
//!
//! The `Authorization` header is the awkward one. Depending on the gateway it
//! may be visible as `HTTP_AUTHORIZATION`, as `REDIRECT_HTTP_AUTHORIZATION`
//! after a rewrite, or only in already decoded form as `PHP_AUTH_USER` /
//! `PHP_AUTH_PW` / `PHP_AUTH_DIGEST`. [`ServerEnvironment::headers`] rebuilds
//! a single canonical `AUTHORIZATION` entry from whichever signal is present:
//!
//! 1. decoded user credentials win over any raw header value;
//! 2. otherwise the raw header is inspected for the `Basic`, `Digest` and
//!    `Bearer` schemes, in that order;
//! 3. an `AUTHORIZATION` entry already carried by the transport is kept as is,
//!    anything else is synthesized from the recovered [`Credentials`].
//!
//! Malformed values are skipped without error; transport metadata is best
//! effort.

use std::ops::Deref;

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use indexmap::IndexMap;

use crate::filter::SharedFilter;
use crate::http::params::ParameterStore;

/// Content metadata variables that are headers despite lacking the `HTTP_` prefix.
pub const CONTENT_HEADERS: [&str; 3] = ["CONTENT_LENGTH", "CONTENT_MD5", "CONTENT_TYPE"];

const HTTP_PREFIX: &str = "HTTP_";
const AUTHORIZATION: &str = "AUTHORIZATION";
const PHP_AUTH_USER: &str = "PHP_AUTH_USER";
const PHP_AUTH_PW: &str = "PHP_AUTH_PW";
const PHP_AUTH_DIGEST: &str = "PHP_AUTH_DIGEST";

// Clients are inconsistent about padding.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Authentication recovered from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic { user: String, password: String },
    /// Full `Digest ...` header value.
    Digest(String),
    /// Full `Bearer ...` header value.
    Bearer(String),
}

impl Credentials {
    /// The `Authorization` header value these credentials stand for.
    pub fn authorization(&self) -> String {
        match self {
            Credentials::Basic { user, password } => {
                format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
            }
            Credentials::Digest(value) | Credentials::Bearer(value) => value.clone(),
        }
    }
}

pub struct ServerEnvironment {
    params: ParameterStore<String>,
}

impl ServerEnvironment {
    pub fn new<I, K>(filter: SharedFilter, variables: I) -> Self
    where
        I: IntoIterator<Item = (K, String)>,
        K: Into<String>,
    {
        Self {
            params: ParameterStore::new(filter, variables),
        }
    }

    /// Recovers the request's credentials without touching the environment.
    pub fn credentials(&self) -> Option<Credentials> {
        if let Some(user) = self.get(PHP_AUTH_USER) {
            return Some(Credentials::Basic {
                user: user.clone(),
                password: self.get_or(PHP_AUTH_PW, String::new()),
            });
        }

        let header = self
            .get("HTTP_AUTHORIZATION")
            .or_else(|| self.get("REDIRECT_HTTP_AUTHORIZATION"))?;

        if has_scheme(header, "basic ") {
            decode_basic(&header["basic ".len()..])
        } else if !self.has_digest() && has_scheme(header, "digest ") {
            Some(Credentials::Digest(header.clone()))
        } else if has_scheme(header, "bearer ") {
            Some(Credentials::Bearer(header.clone()))
        } else {
            None
        }
    }

    /// Rebuilds the request headers from the environment.
    ///
    /// Keys keep their environment form (`ACCEPT_LANGUAGE`, `CONTENT_TYPE`,
    /// `AUTHORIZATION`); the header store normalizes them. When a `Digest`
    /// authorization is recovered, it is also recorded as `PHP_AUTH_DIGEST`
    /// in this environment.
    pub fn headers(&mut self) -> IndexMap<String, String> {
        let mut headers = IndexMap::new();

        for (key, value) in self.all() {
            if let Some(name) = key.strip_prefix(HTTP_PREFIX) {
                headers.insert(name.to_string(), value.clone());
            } else if CONTENT_HEADERS.contains(&key.as_str()) {
                headers.insert(key.clone(), value.clone());
            }
        }

        let credentials = self.credentials();

        if let Some(Credentials::Digest(digest)) = &credentials {
            self.params.set(PHP_AUTH_DIGEST, digest.clone());
        }

        match credentials {
            _ if headers.contains_key(AUTHORIZATION) => {
                tracing::debug!("keeping transport authorization header");
            }
            Some(credentials) => {
                headers.insert(AUTHORIZATION.to_string(), credentials.authorization());
            }
            None => {}
        }

        headers
    }

    fn has_digest(&self) -> bool {
        self.get(PHP_AUTH_DIGEST).is_some_and(|digest| !digest.is_empty())
    }
}

impl Deref for ServerEnvironment {
    type Target = ParameterStore<String>;

    fn deref(&self) -> &Self::Target {
        &self.params
    }
}

impl std::fmt::Debug for ServerEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ServerEnvironment").field(&self.params).finish()
    }
}

fn has_scheme(header: &str, scheme: &str) -> bool {
    header
        .get(..scheme.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
}

fn decode_basic(payload: &str) -> Option<Credentials> {
    let decoded = match LENIENT_BASE64.decode(payload.trim()) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(%err, "ignoring basic authorization with invalid base64");
            return None;
        }
    };

    let Ok(decoded) = String::from_utf8(decoded) else {
        tracing::debug!("ignoring basic authorization that is not utf-8");
        return None;
    };

    let Some((user, password)) = decoded.split_once(':') else {
        tracing::debug!("ignoring basic authorization without user/password separator");
        return None;
    };

    Some(Credentials::Basic {
        user: user.to_string(),
        password: password.to_string(),
    })
}
