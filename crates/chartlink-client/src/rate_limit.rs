//! Client-side request rate limiting.
//!
//! A sliding-window limiter: at most `max_requests` requests may start inside
//! any window of length `period`. Callers that would exceed the budget wait
//! until the oldest request in the window ages out. Waiters are served in
//! arrival order.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::RateLimitConfig;

/// Sliding-window limiter awaited before every outbound request.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    period: Duration,
    window: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Allows `max_requests` per `period`. A budget of zero is treated as one.
    pub fn new(max_requests: u32, period: Duration) -> Self {
        let max_requests = usize::try_from(max_requests.max(1)).unwrap_or(usize::MAX);
        Self {
            max_requests,
            period,
            window: Mutex::new(VecDeque::with_capacity(max_requests.min(1024))),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.period)
    }

    /// Waits until a request may start, then records it.
    pub async fn acquire(&self) {
        let mut window = self.window.lock().await;

        let now = Instant::now();
        self.evict(&mut window, now);

        if window.len() >= self.max_requests
            && let Some(&oldest) = window.front()
        {
            let ready_at = oldest + self.period;
            tracing::debug!(
                wait_ms = u64::try_from(ready_at.saturating_duration_since(now).as_millis())
                    .unwrap_or(u64::MAX),
                "Rate limit reached, waiting"
            );
            tokio::time::sleep_until(ready_at).await;
            self.evict(&mut window, Instant::now());
        }

        window.push_back(Instant::now());
    }

    /// Requests recorded inside the current window.
    pub async fn recent(&self) -> usize {
        let mut window = self.window.lock().await;
        self.evict(&mut window, Instant::now());
        window.len()
    }

    fn evict(&self, window: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = window.front() {
            if now.saturating_duration_since(oldest) >= self.period {
                window.pop_front();
            } else {
                break;
            }
        }
    }
}
