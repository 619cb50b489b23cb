//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter with the specified requests per second
pub fn create_limiter(requests_per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Input messages applied per connection per second.
/// Clients send input on every key change, which can exceed the tick rate in bursts.
pub const INPUT_RATE_LIMIT: u32 = 120;

/// Join requests per connection per second
pub const JOIN_RATE_LIMIT: u32 = 10;

/// Per-connection rate limiter state
#[derive(Clone)]
pub struct ConnectionRateLimiter {
    join_limiter: Arc<Limiter>,
}

impl ConnectionRateLimiter {
    pub fn new() -> Self {
        Self::with_rate(JOIN_RATE_LIMIT)
    }

    pub fn with_rate(joins_per_second: u32) -> Self {
        Self {
            join_limiter: create_limiter(joins_per_second),
        }
    }

    /// Check if a join request is allowed (returns true if allowed)
    pub fn check_join(&self) -> bool {
        self.join_limiter.check().is_ok()
    }
}

impl Default for ConnectionRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Rate limiter that never loses the latest value.
///
/// Values over quota are held back, each replacing the one before, and are
/// released by [`Coalescer::take_ready`] once the quota allows.
pub struct Coalescer<T> {
    limiter: Arc<Limiter>,
    pending: Option<T>,
}

impl<T> Coalescer<T> {
    pub fn new(per_second: u32) -> Self {
        Self {
            limiter: create_limiter(per_second),
            pending: None,
        }
    }

    /// Returns the value if it may be applied now, otherwise keeps it pending
    pub fn offer(&mut self, value: T) -> Option<T> {
        if self.limiter.check().is_ok() {
            self.pending = None;
            Some(value)
        } else {
            self.pending = Some(value);
            None
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Release the pending value if the quota has room for it
    pub fn take_ready(&mut self) -> Option<T> {
        if self.pending.is_some() && self.limiter.check().is_ok() {
            self.pending.take()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn join_burst_above_quota_is_rejected() {
        let limiter = ConnectionRateLimiter::with_rate(3);
        let allowed = (0..10).filter(|_| limiter.check_join()).count();
        assert_eq!(allowed, 3);
    }

    #[test]
    fn zero_rate_still_allows_one() {
        let limiter = ConnectionRateLimiter::with_rate(0);
        assert!(limiter.check_join());
    }

    #[test]
    fn coalescer_keeps_only_newest_over_quota() {
        let mut coalescer = Coalescer::new(3);

        let passed: Vec<u32> = (0..10).filter_map(|n| coalescer.offer(n)).collect();
        assert_eq!(passed, vec![0, 1, 2]);
        assert!(coalescer.has_pending());
        assert_eq!(coalescer.take_ready(), None);

        // One cell replenishes every third of a second
        std::thread::sleep(Duration::from_millis(400));
        assert_eq!(coalescer.take_ready(), Some(9));
        assert!(!coalescer.has_pending());
        assert_eq!(coalescer.take_ready(), None);
    }

    #[test]
    fn value_within_quota_supersedes_pending() {
        let mut coalescer = Coalescer::new(1);
        assert_eq!(coalescer.offer("first"), Some("first"));
        assert_eq!(coalescer.offer("held"), None);

        std::thread::sleep(Duration::from_millis(1100));
        assert_eq!(coalescer.offer("latest"), Some("latest"));
        assert!(!coalescer.has_pending());
    }
}
