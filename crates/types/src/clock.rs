//! [`Clock`] implementations.

use crate::traits::Clock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Reads the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
    }
}

/// Time only moves when you call [`advance`](ManualClock::advance) or
/// [`set`](ManualClock::set).
///
/// Clones share the same underlying time, so a test can keep one handle and
/// give another to the cache.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    current: std::sync::Arc<std::sync::atomic::AtomicU64>,
}

#[cfg(any(test, feature = "test-support"))]
impl ManualClock {
    #[must_use]
    pub fn starting_at(secs: u64) -> Self {
        let clock = Self::default();
        clock.set(secs);
        clock
    }

    pub fn advance(&self, secs: u64) {
        self.current
            .fetch_add(secs, std::sync::atomic::Ordering::SeqCst);
    }

    /// Set the absolute time (vs. relative [`advance`](Self::advance)).
    pub fn set(&self, secs: u64) {
        self.current.store(secs, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Clock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.current.load(std::sync::atomic::Ordering::SeqCst)
    }
}
