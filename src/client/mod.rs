//! Request/response shapes and the [`HttpClient`] pipeline.
//!
//! A request flows through the request [`crate::middleware::MiddlewareChain`],
//! then a [`Driver`], then the response chain, which also sees the response
//! carried by every [`HttpFailure`].

mod core;
mod request;
mod response;

pub use self::core::{Driver, DriverResult, FnDriver, HttpClient};
pub use self::request::{
    HeaderVec, Headers, HttpMethod, HttpRequest, RequestContext, MAX_INLINE_HEADERS,
};
pub use self::response::{status_text, FailureKind, HttpFailure, HttpResponse};
