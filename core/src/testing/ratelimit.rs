use std::time::Duration;

use serde::Serialize;
use tokio::{
    sync::{AcquireError, Mutex, Semaphore, SemaphorePermit},
    time::Instant,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimits {
    pub max_concurrent: usize,
    pub requests_per_second: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            max_concurrent: 10,
            requests_per_second: 20,
        }
    }
}

impl RateLimits {
    /// For the public service, which allows about 5 req/s.
    pub const CONSERVATIVE: Self = Self {
        max_concurrent: 1,
        requests_per_second: 4,
    };

    pub fn new(max_concurrent: usize, requests_per_second: u32) -> Self {
        Self {
            max_concurrent,
            requests_per_second,
        }
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.requests_per_second.max(1)))
    }
}

/// How long to wait so that at least `min_delay` separates two dispatches.
pub fn spacing_wait(last_dispatch: Option<Instant>, now: Instant, min_delay: Duration) -> Duration {
    match last_dispatch {
        None => Duration::ZERO,
        Some(last) => min_delay.saturating_sub(now.saturating_duration_since(last)),
    }
}

#[derive(Debug, Default)]
struct RateState {
    last_dispatch: Option<Instant>,
}

/// Shared by every testcase of one run: bounds in-flight requests and
/// spaces out the start of consecutive requests.
#[derive(Debug)]
pub struct RateLimiter {
    limits: RateLimits,
    permits: Semaphore,
    state: Mutex<RateState>,
}

/// Held for the duration of one remote call.
#[derive(Debug)]
pub struct DispatchPermit<'a> {
    _permit: SemaphorePermit<'a>,
    dispatched_at: Instant,
}

impl DispatchPermit<'_> {
    pub fn dispatched_at(&self) -> Instant {
        self.dispatched_at
    }
}

impl RateLimiter {
    pub fn new(limits: RateLimits) -> Self {
        Self {
            permits: Semaphore::new(limits.max_concurrent.max(1)),
            state: Mutex::new(RateState::default()),
            limits,
        }
    }

    pub fn limits(&self) -> RateLimits {
        self.limits
    }

    pub async fn acquire(&self) -> Result<DispatchPermit<'_>, AcquireError> {
        let permit = self.permits.acquire().await?;

        // check, sleep and stamp under one lock so no two dispatches race past the check
        let mut state = self.state.lock().await;
        let wait = spacing_wait(state.last_dispatch, Instant::now(), self.limits.min_delay());
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        let dispatched_at = Instant::now();
        state.last_dispatch = Some(dispatched_at);
        drop(state);

        Ok(DispatchPermit {
            _permit: permit,
            dispatched_at,
        })
    }

    pub async fn reset(&self) {
        *self.state.lock().await = RateState::default();
    }
}
