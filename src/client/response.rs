use std::fmt;

use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::request::Headers;

/// Human readable status line, e.g. `404 not found`.
#[must_use]
pub fn status_text(status: u16) -> String {
    match StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
    {
        Some(reason) => format!("{status} {}", reason.to_lowercase()),
        None => status.to_string(),
    }
}

/// A completed response, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub payload: Value,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: u16, headers: Headers, payload: Value) -> Self {
        Self {
            status,
            status_text: status_text(status),
            headers,
            payload,
        }
    }

    /// `status < 400`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status < 400
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }
}

/// Why a request did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No route matched the path.
    NotFound,
    /// A route matched the path but not the method.
    MethodNotAllowed,
    /// The handler returned an error or panicked.
    Handler,
    /// The handler deliberately answered with a status >= 400.
    Business,
    /// A JSON content type with a body that does not parse.
    InvalidBody,
    /// Raised by a network driver.
    Transport,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::NotFound => "not found",
            FailureKind::MethodNotAllowed => "method not allowed",
            FailureKind::Handler => "handler error",
            FailureKind::Business => "business error",
            FailureKind::InvalidBody => "invalid body",
            FailureKind::Transport => "transport error",
        })
    }
}

/// A response-shaped failure. The response chain sees `response` just like a
/// successful one.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{kind}: {}", .response.status_text)]
pub struct HttpFailure {
    pub kind: FailureKind,
    pub response: HttpResponse,
}

impl HttpFailure {
    #[must_use]
    pub fn new(kind: FailureKind, response: HttpResponse) -> Self {
        Self { kind, response }
    }

    fn bare(kind: FailureKind, status: u16, payload: Value) -> Self {
        Self::new(kind, HttpResponse::new(status, Headers::new(), payload))
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::bare(FailureKind::NotFound, 404, Value::String(status_text(404)))
    }

    #[must_use]
    pub fn method_not_allowed() -> Self {
        Self::bare(FailureKind::MethodNotAllowed, 405, Value::String(status_text(405)))
    }

    /// 500 carrying the stringified handler error.
    #[must_use]
    pub fn handler(message: impl Into<String>) -> Self {
        Self::bare(FailureKind::Handler, 500, Value::String(message.into()))
    }

    /// 500 for a body that claims to be JSON but does not parse; the raw body is kept.
    #[must_use]
    pub fn invalid_body(headers: Headers, body: String) -> Self {
        Self::new(
            FailureKind::InvalidBody,
            HttpResponse::new(500, headers, Value::String(body)),
        )
    }

    #[must_use]
    pub fn business(response: HttpResponse) -> Self {
        Self::new(FailureKind::Business, response)
    }

    #[must_use]
    pub fn transport(status: u16, message: impl Into<String>) -> Self {
        Self::bare(FailureKind::Transport, status, Value::String(message.into()))
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.response.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_text_uses_lowercase_reason() {
        assert_eq!(status_text(404), "404 not found");
        assert_eq!(status_text(405), "405 method not allowed");
        assert_eq!(status_text(799), "799");
    }

    #[test]
    fn failure_constructors_set_kind_and_status() {
        assert_eq!(HttpFailure::not_found().status(), 404);
        assert_eq!(HttpFailure::method_not_allowed().kind, FailureKind::MethodNotAllowed);
        let failure = HttpFailure::handler("boom");
        assert_eq!(failure.status(), 500);
        assert_eq!(failure.response.payload, Value::String("boom".into()));
        assert_eq!(failure.to_string(), "handler error: 500 internal server error");
    }

    #[test]
    fn payload_decodes_into_typed_value() {
        let res = HttpResponse::new(200, Headers::new(), serde_json::json!([1, 2, 3]));
        assert!(res.is_success());
        assert_eq!(res.json::<Vec<u32>>().unwrap(), vec![1, 2, 3]);
        assert!(res.json::<String>().is_err());
    }
}
