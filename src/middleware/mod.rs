//! Request/response middleware.
//!
//! Two kinds live here: [`MiddlewareChain`], the named transforms an
//! [`crate::client::HttpClient`] folds requests and responses through, and the
//! [`Middleware`] observer trait with its stock implementations.

mod core;
mod metrics;
mod tracing;

pub use self::core::{Middleware, MiddlewareChain, Transform};
pub use self::metrics::{MetricsMiddleware, MetricsSnapshot};
pub use self::tracing::TracingMiddleware;
