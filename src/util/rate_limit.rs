//! Inbound message throttling

use std::num::NonZeroU32;

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};

/// Unkeyed limiter; one per connection
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Quota of `per_second` cells with a burst of the same size. Zero is raised to one.
pub fn quota(per_second: u32) -> Quota {
    Quota::per_second(NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN))
}

/// Per-connection inbound limiter that remembers how much it has shed
pub struct ConnectionRateLimiter {
    inbound: Limiter,
    dropped: u64,
}

impl ConnectionRateLimiter {
    pub fn new(messages_per_second: u32) -> Self {
        Self {
            inbound: RateLimiter::direct(quota(messages_per_second)),
            dropped: 0,
        }
    }

    /// Admit one message. Returns false (and counts it) when over quota.
    pub fn admit(&mut self) -> bool {
        let allowed = self.inbound.check().is_ok();
        if !allowed {
            self.dropped += 1;
        }
        allowed
    }

    /// Messages shed so far on this connection
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
