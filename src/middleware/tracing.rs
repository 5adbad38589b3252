use std::time::Duration;

use tracing::{info, warn};

use super::Middleware;
use crate::client::{DriverResult, HttpRequest};

/// Logs one event per request and one per outcome.
///
/// Successful outcomes are logged at `info`, failures at `warn`, both with the
/// request id so the two events can be correlated.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: &HttpRequest) {
        info!(
            request_id = %req.request_id,
            method = req.method.map(|m| m.as_str()),
            url = %req.url,
            base_url = req.base_url.as_deref(),
            "request"
        );
    }

    fn after(&self, req: &HttpRequest, outcome: &DriverResult, latency: Duration) {
        let latency_ms = latency.as_millis() as u64;
        match outcome {
            Ok(res) => info!(
                request_id = %req.request_id,
                status = res.status,
                latency_ms,
                "response"
            ),
            Err(failure) => warn!(
                request_id = %req.request_id,
                status = failure.response.status,
                kind = %failure.kind,
                latency_ms,
                "response failed"
            ),
        }
    }
}
