//! Fixed-rate pacing for metadata-service lookups.
//!
//! The traversal is strictly sequential, so a single governor instance
//! acquired before every lookup spaces the calls at the configured rate.

use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

/// Type alias for governor's direct rate limiter.
type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Paces requests at one permit per fixed period.
pub struct FetchPacer {
    limiter: DirectLimiter,
    period: Duration,
}

impl FetchPacer {
    /// Create a pacer with the given period between permits.
    pub fn new(period: Duration) -> Self {
        let quota = Quota::with_period(period).expect("period must be > 0");
        Self {
            limiter: DirectLimiter::direct(quota),
            period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait until the next permit is available.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }
}

impl Default for FetchPacer {
    /// One request per second against the metadata service.
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
