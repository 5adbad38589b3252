//! # Configuration
//!
//! [`HttpConfig`] holds the defaults layered under per-request fields plus the
//! mock dispatcher settings in [`MockConfig`]. It can be loaded from a YAML,
//! JSON or TOML file and then overridden from the environment.
//!
//! ## Environment Variables
//!
//! | Variable                     | Field                         |
//! |------------------------------|-------------------------------|
//! | `PATHMOCK_BASE_URL`          | `base_url`                    |
//! | `PATHMOCK_METHOD`            | `method`                      |
//! | `PATHMOCK_TIMEOUT_SECS`      | `timeout_secs`                |
//! | `PATHMOCK_INTERNET_DELAY_MS` | `mock.internet_delay_ms`      |
//! | `PATHMOCK_CACHE_CAPACITY`    | `mock.cache_capacity`         |
//!
//! ## Example
//!
//! ```yaml
//! base_url: /api
//! method: GET
//! timeout_secs: 30
//! mock:
//!   route_prefix: /api
//!   internet_delay_ms: 250
//! ```

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::HttpMethod;
use crate::error::ConfigError;
use crate::pattern::DEFAULT_CACHE_CAPACITY;

/// Client-wide request defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Prepended to every request URL that does not carry its own base.
    pub base_url: String,
    pub timeout_secs: u64,
    pub method: HttpMethod,
    pub with_credentials: bool,
    /// Include request and response payloads in traffic log events.
    pub log_payloads: bool,
    pub mock: MockConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: 3600,
            method: HttpMethod::Post,
            with_credentials: false,
            log_payloads: false,
            mock: MockConfig::default(),
        }
    }
}

/// Settings for [`crate::mock::MockDriver`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    /// Prepended to every registered route path.
    pub route_prefix: String,
    /// Upper bound of the simulated network delay; `0` disables it.
    pub internet_delay_ms: u64,
    pub cache_capacity: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            route_prefix: String::new(),
            internet_delay_ms: 0,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

fn parse_var<T: FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        })
}

impl HttpConfig {
    /// Load from a file. `.toml` is parsed as TOML, anything else as YAML
    /// (which also accepts JSON).
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
        if is_toml {
            toml::from_str(&content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })
        } else {
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    /// Defaults overridden by `PATHMOCK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `PATHMOCK_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PATHMOCK_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("PATHMOCK_METHOD") {
            self.method = v.parse()?;
        }
        if let Some(v) = lookup("PATHMOCK_TIMEOUT_SECS") {
            self.timeout_secs = parse_var("PATHMOCK_TIMEOUT_SECS", v)?;
        }
        if let Some(v) = lookup("PATHMOCK_INTERNET_DELAY_MS") {
            self.mock.internet_delay_ms = parse_var("PATHMOCK_INTERNET_DELAY_MS", v)?;
        }
        if let Some(v) = lookup("PATHMOCK_CACHE_CAPACITY") {
            self.mock.cache_capacity = parse_var("PATHMOCK_CACHE_CAPACITY", v)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
