//! Rate gate implementation

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Delay primitive used by the gate while the quota is exhausted
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend the caller for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Limits how many requests may be issued within a rolling window.
///
/// The gate remembers when each request inside the current window was let
/// through. A caller that finds the window full is suspended until the oldest
/// of those requests leaves the window, so no window of `window` length ever
/// sees more than `max_requests` grants.
pub struct RateGate {
    max_requests: u32,
    window: Duration,
    sleeper: Arc<dyn Sleeper>,
    issued: Mutex<VecDeque<Instant>>,
}

impl RateGate {
    /// Create a gate allowing `max_requests_per_second` requests per second
    pub fn new(max_requests_per_second: u32) -> Result<Self> {
        Self::with_sleeper(
            max_requests_per_second,
            Duration::from_secs(1),
            Arc::new(TokioSleeper),
        )
    }

    /// Create a gate with a custom window and delay primitive
    pub fn with_sleeper(
        max_requests: u32,
        window: Duration,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self> {
        if max_requests == 0 {
            return Err(Error::invalid_setting(
                "max_requests_per_second",
                "must be greater than 0",
            ));
        }
        if window.is_zero() {
            return Err(Error::invalid_setting("window", "must be greater than 0"));
        }

        Ok(Self {
            max_requests,
            window,
            sleeper,
            issued: Mutex::new(VecDeque::with_capacity(max_requests as usize)),
        })
    }

    /// Maximum number of requests per window
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Length of the rate window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait until one more request may be issued.
    ///
    /// Returns [`Error::Cancelled`] immediately when `cancel` is already
    /// cancelled, or as soon as it is cancelled while waiting. A cancelled
    /// acquisition does not consume quota.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // Waiters queue on the lock; the holder sleeps with it held so a
        // freed slot goes to exactly one caller.
        let mut issued = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            guard = self.issued.lock() => guard,
        };

        // Grants are kept in non-decreasing order
        let mut now = match issued.back() {
            Some(&last) => Instant::now().max(last),
            None => Instant::now(),
        };
        loop {
            evict_expired(&mut issued, now, self.window);

            if issued.len() < self.max_requests as usize {
                issued.push_back(now);
                return Ok(());
            }

            let Some(&oldest) = issued.front() else {
                continue;
            };
            let resume_at = oldest + self.window;
            let wait = resume_at.saturating_duration_since(now);
            trace!(wait_ms = wait.as_millis() as u64, "Rate window full, waiting");

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                () = self.sleeper.sleep(wait) => {}
            }

            // The sleeper is trusted to have waited the full duration.
            now = Instant::now().max(resume_at);
        }
    }

    /// Number of requests that could be issued right now without waiting
    pub async fn available(&self) -> u32 {
        let mut issued = self.issued.lock().await;
        evict_expired(&mut issued, Instant::now(), self.window);
        self.max_requests - issued.len() as u32
    }
}

fn evict_expired(issued: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while issued
        .front()
        .is_some_and(|at| now.saturating_duration_since(*at) >= window)
    {
        issued.pop_front();
    }
}

impl std::fmt::Debug for RateGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateGate")
            .field("max_requests", &self.max_requests)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
