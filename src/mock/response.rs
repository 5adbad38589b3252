use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::client::Headers;
use crate::lock::lock;

/// What a handler wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResponseOutput {
    pub status: u16,
    pub headers: Headers,
    pub body: String,
}

impl Default for ResponseOutput {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Headers::new(),
            body: String::new(),
        }
    }
}

/// Response writer handed to mock handlers.
///
/// Cloning yields another handle to the same buffer. Starts as `200` with no
/// headers and an empty body.
#[derive(Debug, Clone, Default)]
pub struct MockResponse {
    output: Arc<Mutex<ResponseOutput>>,
}

impl MockResponse {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&self, status: u16) -> &Self {
        lock(&self.output).status = status;
        self
    }

    /// Append to the body.
    pub fn write(&self, chunk: &str) -> &Self {
        lock(&self.output).body.push_str(chunk);
        self
    }

    /// Replace the body.
    pub fn set_body(&self, body: impl Into<String>) -> &Self {
        lock(&self.output).body = body.into();
        self
    }

    /// Serialize `value` as the body and mark it `application/json`.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<&Self, serde_json::Error> {
        let body = serde_json::to_string(value)?;
        let mut output = lock(&self.output);
        output.headers.insert("content-type", "application/json");
        output.body = body;
        Ok(self)
    }

    pub fn header(&self, name: &str, value: impl Into<String>) -> &Self {
        lock(&self.output).headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        lock(&self.output).status
    }

    #[must_use]
    pub fn body(&self) -> String {
        lock(&self.output).body.clone()
    }

    /// Take the buffered output, leaving a fresh default behind.
    pub(crate) fn take(&self) -> ResponseOutput {
        std::mem::take(&mut *lock(&self.output))
    }
}
