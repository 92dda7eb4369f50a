//! CGI process boundary.
//!
//! This module is the only place that touches ambient process state. It
//! collects the environment variables and the request body handed over by
//! the web server and turns them into plain [`RequestParts`]:
//!
//! - `QUERY_STRING` is decoded into the query store,
//! - `HTTP_COOKIE` is split into the cookie store,
//! - a body of `CONTENT_LENGTH` bytes is read from stdin, kept as raw
//!   content and, for `application/x-www-form-urlencoded` requests, decoded
//!   into the request store.
//!
//! Form keys follow the usual bracket convention: `tags[]=a&tags[]=b` builds
//! a list and `user[name]=x` builds a map.

use std::io::Read;

use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use url::form_urlencoded;

use crate::config::config;
use crate::error::RequestError;
use crate::filter::SharedFilter;
use crate::http::request::{HttpRequest, RequestParts};
use crate::http::value::Value;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Builds the request from this process's environment and stdin.
pub fn from_process(filter: SharedFilter) -> Result<HttpRequest, RequestError> {
    let server = std::env::vars_os()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                tracing::debug!(?key, "skipping environment variable that is not utf-8");
                None
            }
        })
        .collect();

    from_parts(filter, server, std::io::stdin().lock(), config().max_body_size)
}

/// Builds the request from an explicit environment and body reader.
pub fn from_parts(
    filter: SharedFilter,
    server: IndexMap<String, String>,
    body: impl Read,
    max_body_size: usize,
) -> Result<HttpRequest, RequestError> {
    let query = server
        .get("QUERY_STRING")
        .map(|qs| parse_form(qs.as_bytes()))
        .unwrap_or_default();

    let cookies = server
        .get("HTTP_COOKIE")
        .map(String::as_str)
        .map(parse_cookies)
        .unwrap_or_default();

    let content = read_body(&server, body, max_body_size)?;

    let request = match (&content, server.get("CONTENT_TYPE")) {
        (Some(bytes), Some(content_type)) if is_form(content_type) => parse_form(bytes),
        _ => IndexMap::new(),
    };

    Ok(HttpRequest::new(
        filter,
        RequestParts {
            query,
            request,
            attributes: IndexMap::new(),
            cookies,
            server,
            content,
        },
    ))
}

fn read_body(
    server: &IndexMap<String, String>,
    body: impl Read,
    max_body_size: usize,
) -> Result<Option<Vec<u8>>, RequestError> {
    let Some(length) = server
        .get("CONTENT_LENGTH")
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
    else {
        return Ok(None);
    };

    let size = length
        .parse::<usize>()
        .map_err(|_| RequestError::InvalidContentLength(length.to_string()))?;

    if size > max_body_size {
        return Err(RequestError::BodyTooLarge {
            size,
            limit: max_body_size,
        });
    }

    let mut content = Vec::with_capacity(size);
    body.take(size as u64).read_to_end(&mut content)?;

    if content.len() < size {
        tracing::debug!(expected = size, read = content.len(), "request body ended early");
    }

    Ok(Some(content))
}

fn is_form(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

/// Decodes `application/x-www-form-urlencoded` data.
pub fn parse_form(input: &[u8]) -> IndexMap<String, Value> {
    let mut params = IndexMap::new();
    for (key, value) in form_urlencoded::parse(input) {
        insert_param(&mut params, &key, value.into_owned());
    }
    params
}

fn insert_param(params: &mut IndexMap<String, Value>, key: &str, value: String) {
    let value = Value::Str(value);

    let Some((name, sub)) = key
        .split_once('[')
        .and_then(|(name, rest)| Some((name, rest.strip_suffix(']')?)))
        .filter(|(name, _)| !name.is_empty())
    else {
        params.insert(key.to_string(), value);
        return;
    };

    let slot = params.entry(name.to_string()).or_default();
    *slot = match (std::mem::take(slot), sub) {
        (Value::List(mut items), "") => {
            items.push(value);
            Value::List(items)
        }
        (Value::Map(mut map), "") => {
            let index = map.len().to_string();
            map.insert(index, value);
            Value::Map(map)
        }
        (Value::Map(mut map), sub) => {
            map.insert(sub.to_string(), value);
            Value::Map(map)
        }
        (Value::List(items), sub) => {
            let mut map: IndexMap<String, Value> = items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (i.to_string(), item))
                .collect();
            map.insert(sub.to_string(), value);
            Value::Map(map)
        }
        (_, "") => Value::List(vec![value]),
        (_, sub) => Value::Map(IndexMap::from([(sub.to_string(), value)])),
    };
}

/// Splits a `Cookie` header into name/value pairs.
pub fn parse_cookies(header: &str) -> IndexMap<String, Value> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = value.trim().replace('+', " ");
            let value = percent_decode_str(&value).decode_utf8_lossy().into_owned();
            Some((name.to_string(), Value::Str(value)))
        })
        .collect()
}
