use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;
use crate::filter::DEFAULT_FILTER;

static CONFIG: OnceCell<CgiConfig> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CgiConfig {
    /// Filter applied to parameters the binary reports.
    pub default_filter: String,

    /// Largest request body read from stdin, in bytes.
    pub max_body_size: usize,

    /// `tracing` directive used when `RUST_LOG` is not set.
    pub log_filter: String,

    /// Store whose entries the binary reports (`query`, `request`, ...).
    pub source: String,
}

impl Default for CgiConfig {
    fn default() -> Self {
        Self {
            default_filter: DEFAULT_FILTER.to_string(),
            max_body_size: 1024 * 1024, // 1 MB
            log_filter: "rustyreq=info".to_string(),
            source: "query".to_string(),
        }
    }
}

impl CgiConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str::<CgiConfig>(&content)?)
    }
}

/// Installs the process-wide config. Returns the rejected value if one is
/// already installed.
pub fn set_config(cfg: CgiConfig) -> Result<(), CgiConfig> {
    CONFIG.set(cfg)
}

/// The process-wide config, or the defaults if none was installed.
pub fn config() -> &'static CgiConfig {
    CONFIG.get_or_init(CgiConfig::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: CgiConfig = toml::from_str("max_body_size = 10\nsource = \"cookies\"").unwrap();
        assert_eq!(cfg.max_body_size, 10);
        assert_eq!(cfg.source, "cookies");
        assert_eq!(cfg.default_filter, DEFAULT_FILTER);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            CgiConfig::from_file("/nonexistent/rustyreq.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let path = std::env::temp_dir().join(format!("rustyreq-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "max_body_size = \"lots\"").unwrap();

        let result = CgiConfig::from_file(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
