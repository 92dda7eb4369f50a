use thiserror::Error;

use crate::http::status::HttpStatus;

/// Errors raised while assembling or reading a request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// A caller asked by name for request state that is not exposed.
    #[error("read access to HttpRequest::{0} is not allowed")]
    AccessViolation(String),

    #[error("failed to read request body: {0}")]
    Body(#[from] std::io::Error),

    #[error("request body of {size} bytes exceeds the limit of {limit} bytes")]
    BodyTooLarge { size: usize, limit: usize },

    #[error("invalid CONTENT_LENGTH {0:?}")]
    InvalidContentLength(String),
}

impl RequestError {
    pub fn into_http_status(self) -> HttpStatus {
        match self {
            RequestError::BodyTooLarge { .. } => HttpStatus::PayloadTooLarge,
            RequestError::InvalidContentLength(_) => HttpStatus::BadRequest,
            RequestError::AccessViolation(_) | RequestError::Body(_) => {
                HttpStatus::InternalServerError
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to deserialize config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let too_large = RequestError::BodyTooLarge { size: 2, limit: 1 };
        assert_eq!(
            too_large.to_string(),
            "request body of 2 bytes exceeds the limit of 1 bytes"
        );
        assert_eq!(too_large.into_http_status(), HttpStatus::PayloadTooLarge);
        assert_eq!(
            RequestError::InvalidContentLength("x".into()).into_http_status(),
            HttpStatus::BadRequest
        );
        assert_eq!(
            RequestError::AccessViolation("filter".into()).into_http_status(),
            HttpStatus::InternalServerError
        );
    }
}
