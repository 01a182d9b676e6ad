use std::sync::Arc;
use std::thread;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Enforces a minimum delay between successive provider calls.
///
/// Shared by every call of one sync or ingest run, regardless of how many
/// ranges or symbols it touches. A zero interval disables pacing.
#[derive(Clone)]
pub struct CallPacer {
    limiter: Option<Arc<DirectRateLimiter>>,
    clock: DefaultClock,
}

impl CallPacer {
    pub fn new(min_interval: Duration) -> Self {
        let limiter = Quota::with_period(min_interval)
            .map(|quota| Arc::new(RateLimiter::direct(quota)));
        Self {
            limiter,
            clock: DefaultClock::default(),
        }
    }

    /// Block until the next call is allowed; returns the time spent waiting.
    pub fn wait(&self) -> Duration {
        let Some(limiter) = &self.limiter else {
            return Duration::ZERO;
        };

        let mut waited = Duration::ZERO;
        while let Err(not_until) = limiter.check() {
            let delay = not_until.wait_time_from(self.clock.now());
            thread::sleep(delay.max(Duration::from_millis(1)));
            waited += delay;
        }
        waited
    }
}
