//! Time sources for the timer coordinator
//!
//! All elapsed/remaining computations run on a monotonic reading (`MonoInstant`).
//! Wall-clock time is only derived from it, for payloads leaving the process.

use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicI64, Ordering},
        Mutex,
    },
    time::{Duration, Instant},
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A reading of a monotonic clock, in milliseconds from the clock's own origin.
///
/// Signed so that instants restored from before the origin (process start) stay representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonoInstant(i64);

impl MonoInstant {
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Shift by a signed number of seconds
    pub fn plus_secs(self, secs: i64) -> Self {
        Self(self.0.saturating_add(secs.saturating_mul(1000)))
    }

    /// Signed milliseconds from `earlier` to `self`
    pub fn millis_since(self, earlier: MonoInstant) -> i64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Duration from `earlier` to `self`, zero if `earlier` is later
    pub fn saturating_since(self, earlier: MonoInstant) -> Duration {
        Duration::from_millis(self.millis_since(earlier).max(0) as u64)
    }
}

/// Source of monotonic and wall-clock time
pub trait Clock: Send + Sync + Debug {
    /// Current monotonic reading
    fn now(&self) -> MonoInstant;

    /// Current wall-clock time
    fn wall_now(&self) -> DateTime<Utc>;

    /// Project a monotonic instant onto the wall clock, saturating at the
    /// ends of the representable date range
    fn to_wall(&self, at: MonoInstant) -> DateTime<Utc> {
        let offset = at.millis_since(self.now());
        self.wall_now()
            .checked_add_signed(TimeDelta::milliseconds(offset))
            .unwrap_or(if offset > 0 { DateTime::<Utc>::MAX_UTC } else { DateTime::<Utc>::MIN_UTC })
    }

    /// Anchor a wall-clock instant on the monotonic clock
    fn from_wall(&self, at: DateTime<Utc>) -> MonoInstant {
        let offset = (at - self.wall_now()).num_milliseconds();
        MonoInstant(self.now().0.saturating_add(offset))
    }
}

/// Production clock backed by `std::time::Instant` and the system wall clock
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> MonoInstant {
        MonoInstant(self.origin.elapsed().as_millis() as i64)
    }

    fn wall_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests and simulations. Only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicI64,
    wall_origin: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Start at monotonic zero, anchored to the given wall-clock time
    pub fn starting_at(wall_origin: DateTime<Utc>) -> Self {
        Self {
            now_ms: AtomicI64::new(0),
            wall_origin: Mutex::new(wall_origin),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    /// Move the wall clock without touching the monotonic reading (user changed the device time)
    pub fn shift_wall(&self, by: TimeDelta) {
        if let Ok(mut origin) = self.wall_origin.lock() {
            *origin += by;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::starting_at(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> MonoInstant {
        MonoInstant(self.now_ms.load(Ordering::SeqCst))
    }

    fn wall_now(&self) -> DateTime<Utc> {
        let origin = self
            .wall_origin
            .lock()
            .map(|origin| *origin)
            .unwrap_or_else(|poisoned| *poisoned.into_inner());
        origin + TimeDelta::milliseconds(self.now().0)
    }
}
