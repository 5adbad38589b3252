//! Error types shared across the crate.
//!
//! Library code returns these typed errors; the CLI and handlers use `anyhow`
//! at the edges.

use std::path::PathBuf;

use thiserror::Error;

use crate::client::HttpFailure;

/// Errors raised while compiling a path template or generating a path from one.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The generated (or user supplied) expression was rejected by the regex engine.
    #[error("invalid pattern expression `{source_text}`: {message}")]
    InvalidRegex {
        source_text: String,
        message: String,
    },
    /// A required parameter was not supplied to [`crate::pattern::to_path`].
    #[error("expected parameter `{0}` to be provided")]
    MissingParam(String),
    /// A supplied parameter value does not satisfy the parameter's capture pattern.
    #[error("expected parameter `{name}` to match `{pattern}`, got `{value}`")]
    InvalidParam {
        name: String,
        pattern: String,
        value: String,
    },
    /// Several values were supplied for a parameter that does not repeat.
    #[error("expected parameter `{0}` to not repeat")]
    UnexpectedRepeat(String),
    /// The regex engine gave up while matching (backtracking limit).
    #[error("pattern execution failed: {0}")]
    Execution(String),
}

impl PatternError {
    pub(crate) fn invalid_regex(source_text: &str, err: impl std::fmt::Display) -> Self {
        PatternError::InvalidRegex {
            source_text: source_text.to_string(),
            message: err.to_string(),
        }
    }
}

/// Errors raised while loading configuration or fixture files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse YAML/JSON in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to parse TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value `{value}` for {key}")]
    InvalidValue { key: String, value: String },
}

/// Errors surfaced by [`crate::client::HttpClient::request`].
#[derive(Debug, Error)]
pub enum HttpError {
    /// No driver was passed to the call and none was configured on the client.
    #[error("no HTTP driver configured")]
    MissingDriver,
    /// The driver produced a response-shaped failure (404, 405, 500, or status >= 400).
    #[error("request failed with status {}", .0.response.status)]
    Failure(Box<HttpFailure>),
}

impl HttpError {
    /// The failure carried by this error, if it is response-shaped.
    #[must_use]
    pub fn failure(&self) -> Option<&HttpFailure> {
        match self {
            HttpError::Failure(failure) => Some(failure),
            HttpError::MissingDriver => None,
        }
    }
}

impl From<HttpFailure> for HttpError {
    fn from(failure: HttpFailure) -> Self {
        HttpError::Failure(Box::new(failure))
    }
}
