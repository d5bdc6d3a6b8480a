use std::num::NonZeroU32;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Client-side request pacing for one marketplace.
///
/// Calls wait for budget instead of failing; a server-side 429 is still
/// surfaced as `RateLimited` and never retried here.
pub struct RequestPacer {
    limiter: DirectRateLimiter,
    requests_per_second: NonZeroU32,
}

impl RequestPacer {
    /// Returns `None` for a zero budget, which disables pacing.
    pub fn per_second(requests_per_second: u32) -> Option<Self> {
        let rate = NonZeroU32::new(requests_per_second)?;
        Some(Self {
            limiter: RateLimiter::direct(Quota::per_second(rate).allow_burst(rate)),
            requests_per_second: rate,
        })
    }

    pub fn requests_per_second(&self) -> u32 {
        self.requests_per_second.get()
    }

    /// Takes one cell of budget without waiting.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    /// Waits until one cell of budget is available.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for RequestPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPacer")
            .field("requests_per_second", &self.requests_per_second)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_budget_disables_pacing() {
        assert!(RequestPacer::per_second(0).is_none());
    }

    #[test]
    fn burst_matches_requests_per_second() {
        let pacer = RequestPacer::per_second(2).expect("non-zero budget");

        assert_eq!(pacer.requests_per_second(), 2);
        assert!(pacer.try_acquire());
        assert!(pacer.try_acquire());
        assert!(!pacer.try_acquire());
    }
}
