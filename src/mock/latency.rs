//! Simulated network latency.
//!
//! Each handled request sleeps for a uniformly random duration in
//! `[0, max_delay]`. [`LatencyControl::disable`] wakes every in-flight delay
//! immediately and skips future ones, so tests can run without waiting. Under
//! `tokio::time::pause` the delays can also be fast-forwarded.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tracing::trace;

/// Cancellation handle for a [`Latency`].
#[derive(Debug, Clone)]
pub struct LatencyControl {
    disabled: Arc<watch::Sender<bool>>,
}

impl LatencyControl {
    /// Cancel in-flight delays and stop delaying new requests.
    pub fn disable(&self) {
        self.disabled.send_replace(true);
    }

    pub fn enable(&self) {
        self.disabled.send_replace(false);
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        *self.disabled.borrow()
    }
}

/// Random delay source.
#[derive(Debug)]
pub struct Latency {
    max_delay: Duration,
    disabled: Arc<watch::Sender<bool>>,
}

impl Latency {
    #[must_use]
    pub fn new(max_delay: Duration) -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            max_delay,
            disabled: Arc::new(tx),
        }
    }

    #[must_use]
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    #[must_use]
    pub fn control(&self) -> LatencyControl {
        LatencyControl {
            disabled: Arc::clone(&self.disabled),
        }
    }

    fn sample(&self) -> Duration {
        let max_ms = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }

    /// Sleep for a random delay. Returns the time actually waited, which is
    /// zero when latency is off and shorter than sampled when cancelled.
    pub async fn wait(&self) -> Duration {
        if self.max_delay.is_zero() || *self.disabled.borrow() {
            return Duration::ZERO;
        }
        let delay = self.sample();
        let mut cancelled = self.disabled.subscribe();
        let start = tokio::time::Instant::now();
        tokio::select! {
            () = tokio::time::sleep(delay) => {
                trace!(delay_ms = delay.as_millis() as u64, "Simulated latency elapsed");
            }
            _ = cancelled.wait_for(|disabled| *disabled) => {
                trace!("Simulated latency cancelled");
            }
        }
        start.elapsed()
    }
}
