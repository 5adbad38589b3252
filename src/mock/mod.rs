//! # Mock Module
//!
//! [`MockDriver`] simulates an HTTP server in-process: handlers registered
//! against path templates answer requests, and their output is normalised into
//! an [`crate::client::HttpResponse`] or an [`crate::client::HttpFailure`].
//!
//! ## Example
//!
//! ```
//! use pathmock::client::{HttpMethod, HttpRequest};
//! use pathmock::mock::{MockDriver, MockResponse};
//!
//! async fn get_item(req: HttpRequest, res: MockResponse) -> anyhow::Result<()> {
//!     let id: u64 = req.param("id").unwrap_or_default().parse()?;
//!     res.json(&serde_json::json!({ "id": id }))?;
//!     Ok(())
//! }
//!
//! let driver = MockDriver::default();
//! driver.get("/items/:id", get_item).unwrap();
//!
//! let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
//! let res = rt
//!     .block_on(driver.dispatch(HttpRequest::new("/items/7").method(HttpMethod::Get)))
//!     .unwrap();
//! assert_eq!(res.payload, serde_json::json!({ "id": 7 }));
//! ```

mod core;
mod fixtures;
mod latency;
mod response;

pub use self::core::{Handler, HandlerFuture, MockDriver, Route};
pub use self::fixtures::{load_fixtures, parse_fixtures, Fixture};
pub use self::latency::{Latency, LatencyControl};
pub use self::response::MockResponse;
