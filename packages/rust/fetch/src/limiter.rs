//! Per-host request spacing.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Enforces a minimum interval between dispatches to the same host.
///
/// Each host gets its own serialization point holding the last dispatch
/// instant. Callers for the same host queue on that lock, so spacing holds
/// no matter how many tasks are in flight.
#[derive(Debug, Clone)]
pub struct HostRateLimiter {
    default_rate: f64,
    overrides: Arc<BTreeMap<String, f64>>,
    slots: Arc<Mutex<HashMap<String, Arc<Mutex<Option<Instant>>>>>>,
}

impl HostRateLimiter {
    /// `rate_per_second <= 0` disables spacing for hosts without an override.
    pub fn new(rate_per_second: f64, overrides: BTreeMap<String, f64>) -> Self {
        Self {
            default_rate: rate_per_second,
            overrides: Arc::new(overrides),
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Minimum spacing for `host`, or `None` when unlimited.
    ///
    /// Rates whose interval does not fit a [`Duration`] (NaN, infinite or
    /// vanishingly small) are treated as unlimited; config validation keeps
    /// them out of normal runs.
    pub fn interval_for(&self, host: &str) -> Option<Duration> {
        let rate = self.overrides.get(host).copied().unwrap_or(self.default_rate);
        if rate.is_nan() || rate <= 0.0 {
            return None;
        }
        match Duration::try_from_secs_f64(1.0 / rate) {
            Ok(interval) => Some(interval),
            Err(_) => {
                warn!(host, rate, "unusable rate limit, not spacing requests");
                None
            }
        }
    }

    /// Wait until a request to `host` may be dispatched, then record the
    /// dispatch time.
    pub async fn acquire(&self, host: &str) {
        let Some(interval) = self.interval_for(host) else {
            return;
        };

        let slot = {
            let mut slots = self.slots.lock().await;
            slots.entry(host.to_string()).or_default().clone()
        };

        let mut last = slot.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < interval {
                let wait = interval - elapsed;
                debug!(host, wait_ms = wait.as_millis() as u64, "rate limiting");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}
