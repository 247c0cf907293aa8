//! Time abstractions for testable timestamps.
//!
//! Repositories stamp `created_at` through a [`Clock`] so that ordering
//! behaviour can be exercised deterministically in tests.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use chrono::{DateTime, Utc};

/// Clock abstraction for time operations.
///
/// Production code uses `RealClock`, tests inject `TestClock`.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Returns the current instant for duration measurements.
    fn now(&self) -> Instant;

    /// Returns the current system time for timestamps.
    fn now_system(&self) -> SystemTime;

    /// Returns the current system time as a UTC timestamp.
    fn now_utc(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.now_system())
    }
}

/// Real clock implementation using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl RealClock {
    /// Creates a new real clock instance.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for RealClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn now_system(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Test clock for deterministic time control.
///
/// Clones share the same underlying time, so a clock handed to a store can
/// still be advanced from the test body.
#[derive(Debug, Clone)]
pub struct TestClock {
    /// Monotonic time in nanoseconds since start
    monotonic_ns: Arc<AtomicU64>,
    /// System time as nanoseconds since UNIX_EPOCH
    system_ns: Arc<AtomicU64>,
    base_instant: Instant,
}

impl TestClock {
    /// Creates a new test clock starting at current time.
    pub fn new() -> Self {
        Self::with_start_time(SystemTime::now())
    }

    /// Creates a test clock starting at a specific time.
    pub fn with_start_time(start: SystemTime) -> Self {
        let since_epoch = start.duration_since(UNIX_EPOCH).unwrap_or_default();

        Self {
            monotonic_ns: Arc::new(AtomicU64::new(0)),
            system_ns: Arc::new(AtomicU64::new(saturating_nanos(since_epoch))),
            base_instant: Instant::now(),
        }
    }

    /// Advances both clocks by the specified duration.
    pub fn advance(&self, duration: Duration) {
        let duration_ns = saturating_nanos(duration);
        self.monotonic_ns.fetch_add(duration_ns, Ordering::AcqRel);
        self.system_ns.fetch_add(duration_ns, Ordering::AcqRel);
    }

    /// Returns elapsed time since clock creation.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.monotonic_ns.load(Ordering::Acquire))
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        self.base_instant + Duration::from_nanos(self.monotonic_ns.load(Ordering::Acquire))
    }

    fn now_system(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_nanos(self.system_ns.load(Ordering::Acquire))
    }
}

fn saturating_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
