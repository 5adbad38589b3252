//! Static routes loaded from a YAML or JSON file.
//!
//! ```yaml
//! - path: /items/:id
//!   method: GET
//!   json: { id: 7, name: widget }
//! - path: /items/:id
//!   method: DELETE
//!   status: 204
//! - path: /echo/:name
//!   method: POST
//!   echo: true
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::core::MockDriver;
use super::response::MockResponse;
use crate::client::{HttpMethod, HttpRequest};
use crate::error::{ConfigError, PatternError};

fn default_method() -> HttpMethod {
    HttpMethod::Get
}

fn default_status() -> u16 {
    200
}

/// One canned route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub path: String,
    #[serde(default = "default_method")]
    pub method: HttpMethod,
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Serialized as the body with a JSON content type.
    #[serde(default)]
    pub json: Option<Value>,
    /// Raw body, used when `json` is absent.
    #[serde(default)]
    pub body: Option<String>,
    /// Answer with the matched params and the request payload.
    #[serde(default)]
    pub echo: bool,
}

impl Fixture {
    fn respond(&self, request: &HttpRequest, response: &MockResponse) -> anyhow::Result<()> {
        response.set_status(self.status);
        if self.echo {
            let params = request
                .context
                .route_match
                .as_ref()
                .map(|m| m.params_map())
                .unwrap_or_default();
            response.json(&json!({ "params": params, "payload": request.payload }))?;
        } else if let Some(value) = &self.json {
            response.json(value)?;
        } else if let Some(body) = &self.body {
            response.set_body(body.as_str());
        }
        for (name, value) in &self.headers {
            response.header(name, value.as_str());
        }
        Ok(())
    }
}

/// Parse a fixture list. JSON is accepted as a subset of YAML.
pub fn parse_fixtures(content: &str) -> Result<Vec<Fixture>, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

pub fn load_fixtures(path: &Path) -> Result<Vec<Fixture>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_fixtures(&content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

impl MockDriver {
    /// Register every fixture as a route, in order. Returns how many were added.
    pub fn register_fixtures(&self, fixtures: &[Fixture]) -> Result<usize, PatternError> {
        for fixture in fixtures {
            let canned = Arc::new(fixture.clone());
            self.route(
                &fixture.path,
                fixture.method,
                move |req: HttpRequest, res: MockResponse| {
                    let canned = Arc::clone(&canned);
                    async move { canned.respond(&req, &res) }
                },
            )?;
        }
        Ok(fixtures.len())
    }
}
