//! Shared health state for the /health endpoint.
//! Updated by the ContestRefresher.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Shared refresh health. Written by the refresher, read by the API.
#[derive(Default)]
pub struct HealthState {
    /// True when the last contest refresh succeeded.
    pub last_refresh_ok: AtomicBool,
    /// Unix seconds of the last successful refresh (0 = never).
    pub last_refresh_at: AtomicU64,
    /// Consecutive failed refreshes since the last success.
    pub consecutive_failures: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, now_secs: u64) {
        self.last_refresh_ok.store(true, Ordering::Relaxed);
        self.last_refresh_at.store(now_secs, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.last_refresh_ok.store(false, Ordering::Relaxed);
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn last_refresh_ok(&self) -> bool {
        self.last_refresh_ok.load(Ordering::Relaxed)
    }

    pub fn last_refresh_at(&self) -> u64 {
        self.last_refresh_at.load(Ordering::Relaxed)
    }

    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }
}
