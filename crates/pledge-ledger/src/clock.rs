//! Time sources for settlement checks.
//!
//! Timeouts are compared against [`Clock::unix_timestamp`] once per
//! transaction; nothing in the ledger waits on time.

use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use chrono::{DateTime, Utc};

/// Current time in unix seconds.
pub trait Clock {
    fn unix_timestamp(&self) -> i64;

    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.unix_timestamp(), 0).unwrap_or_default()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn unix_timestamp(&self) -> i64 {
        (**self).unix_timestamp()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_timestamp(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// A deterministic clock. Time only moves when you tell it to.
#[derive(Debug, Default)]
pub struct ManualClock {
    current: AtomicI64,
}

impl ManualClock {
    #[must_use]
    pub fn new(initial_secs: i64) -> Self {
        Self {
            current: AtomicI64::new(initial_secs),
        }
    }

    /// Advance by `secs` (may be negative).
    pub fn advance(&self, secs: i64) {
        self.current.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn set(&self, secs: i64) {
        self.current.store(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn unix_timestamp(&self) -> i64 {
        self.current.load(Ordering::SeqCst)
    }
}
