use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use serde::Serialize;

use super::Middleware;
use crate::client::{DriverResult, HttpRequest};

/// Counts requests and their outcomes.
///
/// All counters use relaxed atomics; readings are eventually consistent.
#[derive(Debug, Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    success_count: AtomicUsize,
    failure_count: AtomicUsize,
    // index 0 holds 1xx, index 4 holds 5xx
    status_classes: [AtomicUsize; 5],
    total_latency_ns: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: usize,
    pub successes: usize,
    pub failures: usize,
    pub status_1xx: usize,
    pub status_2xx: usize,
    pub status_3xx: usize,
    pub status_4xx: usize,
    pub status_5xx: usize,
}

impl MetricsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Mean time spent in the driver, zero before the first response.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let completed = (self.success_count.load(Ordering::Relaxed)
            + self.failure_count.load(Ordering::Relaxed)) as u64;
        if completed == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / completed)
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let class = |i: usize| self.status_classes[i].load(Ordering::Relaxed);
        MetricsSnapshot {
            requests: self.request_count(),
            successes: self.success_count.load(Ordering::Relaxed),
            failures: self.failure_count.load(Ordering::Relaxed),
            status_1xx: class(0),
            status_2xx: class(1),
            status_3xx: class(2),
            status_4xx: class(3),
            status_5xx: class(4),
        }
    }
}

impl Middleware for MetricsMiddleware {
    fn before(&self, _req: &HttpRequest) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    fn after(&self, _req: &HttpRequest, outcome: &DriverResult, latency: Duration) {
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        let status = match outcome {
            Ok(res) => {
                self.success_count.fetch_add(1, Ordering::Relaxed);
                res.status
            }
            Err(failure) => {
                self.failure_count.fetch_add(1, Ordering::Relaxed);
                failure.response.status
            }
        };
        if let Some(slot) = (status / 100)
            .checked_sub(1)
            .and_then(|i| self.status_classes.get(usize::from(i)))
        {
            slot.fetch_add(1, Ordering::Relaxed);
        }
    }
}
