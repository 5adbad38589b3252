//! # pathmock
//!
//! **pathmock** compiles Express-style path templates into anchored regular
//! expressions and uses them to drive an in-process mock HTTP server, so a
//! request/middleware client can be exercised without any network.
//!
//! ## Architecture
//!
//! - **[`pattern`]** - template tokenizer, regex builder, LRU pattern cache and matcher
//! - **[`client`]** - request/response types, the [`client::Driver`] seam and [`client::HttpClient`]
//! - **[`middleware`]** - named request/response transform chains and stock observers
//! - **[`mock`]** - [`mock::MockDriver`], the route table that simulates a server
//! - **[`config`]** - client defaults and mock settings from files and the environment
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`cli`]** - the `pathmock` binary
//!
//! ## Request Flow
//!
//! ```text
//! HttpRequest
//!   -> request chain (named transforms, in order)
//!   -> Driver::call            (MockDriver: match route, simulate latency, run handler)
//!   -> response chain          (runs on the response or on the failure's response)
//!   -> Result<HttpResponse, HttpError>
//! ```
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use pathmock::client::{HttpClient, HttpRequest};
//! use pathmock::config::HttpConfig;
//! use pathmock::mock::{MockDriver, MockResponse};
//!
//! async fn get_user(req: HttpRequest, res: MockResponse) -> anyhow::Result<()> {
//!     res.json(&serde_json::json!({ "id": req.param("id") }))?;
//!     Ok(())
//! }
//!
//! let config = HttpConfig::default();
//! let driver = MockDriver::new(&config);
//! driver.get("/users/:id", get_user).unwrap();
//!
//! let client = HttpClient::new(config);
//! client.set_driver(Arc::new(driver));
//!
//! let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
//! let res = rt.block_on(client.get("/users/42")).unwrap();
//! assert_eq!(res.payload["id"], "42");
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod ids;
mod lock;
pub mod logging;
pub mod middleware;
pub mod mock;
pub mod pattern;

pub use client::{Driver, HttpClient, HttpFailure, HttpMethod, HttpRequest, HttpResponse};
pub use config::{HttpConfig, MockConfig};
pub use error::{ConfigError, HttpError, PatternError};
pub use mock::{MockDriver, MockResponse};
pub use pattern::{match_path, MatchResult, RoutePattern};
