//! Timer state structure and the elapsed/remaining arithmetic

use serde::{Deserialize, Serialize};

use crate::clock::MonoInstant;

/// Which of the two coordinator timers a state describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    /// Ascending, unbounded
    Workout,
    /// Descending, bounded by `target_duration_secs`
    Rest,
}

/// Canonical data for one timer. Displayed values are always derived from
/// `reference` and a fresh clock reading, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    pub kind: TimerKind,
    pub active: bool,
    /// When the timer was (re)started
    pub reference: Option<MonoInstant>,
    /// Rest only: total configured duration, adjustments included
    pub target_duration_secs: Option<u64>,
    /// Workout only: seconds banked before `reference`
    pub banked_secs: u64,
}

impl TimerState {
    /// Create an inactive workout timer
    pub fn workout() -> Self {
        Self {
            kind: TimerKind::Workout,
            active: false,
            reference: None,
            target_duration_secs: None,
            banked_secs: 0,
        }
    }

    /// Create an inactive rest timer
    pub fn rest() -> Self {
        Self {
            kind: TimerKind::Rest,
            ..Self::workout()
        }
    }

    /// Instant at which a rest timer reaches zero
    pub fn target_instant(&self) -> Option<MonoInstant> {
        match (self.reference, self.target_duration_secs) {
            (Some(reference), Some(duration)) => Some(reference.plus_secs(duration as i64)),
            _ => None,
        }
    }

    /// Whole seconds elapsed, floored. Banked seconds plus the running stretch.
    pub fn elapsed_secs(&self, now: MonoInstant) -> u64 {
        let running = match (self.active, self.reference) {
            (true, Some(reference)) => now.saturating_since(reference).as_secs(),
            _ => 0,
        };
        self.banked_secs + running
    }

    /// Whole seconds remaining on a rest timer, rounded up and clamped to
    /// `[0, target_duration_secs]`. Zero when inactive.
    pub fn remaining_secs(&self, now: MonoInstant) -> u64 {
        if !self.active {
            return 0;
        }
        let (Some(target), Some(duration)) = (self.target_instant(), self.target_duration_secs) else {
            return 0;
        };
        let millis = target.millis_since(now).max(0) as u64;
        millis.div_ceil(1000).min(duration)
    }

    /// Reset to inactive, keeping the kind
    pub fn clear(&mut self) {
        *self = match self.kind {
            TimerKind::Workout => Self::workout(),
            TimerKind::Rest => Self::rest(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> MonoInstant {
        MonoInstant::from_millis(secs * 1000)
    }

    fn running_rest(duration: u64) -> TimerState {
        TimerState {
            active: true,
            reference: Some(at(0)),
            target_duration_secs: Some(duration),
            ..TimerState::rest()
        }
    }

    #[test]
    fn remaining_rounds_up_partial_seconds() {
        let rest = running_rest(90);
        assert_eq!(rest.remaining_secs(at(0)), 90);
        assert_eq!(rest.remaining_secs(MonoInstant::from_millis(1)), 90);
        assert_eq!(rest.remaining_secs(MonoInstant::from_millis(89_001)), 1);
        assert_eq!(rest.remaining_secs(at(90)), 0);
        assert_eq!(rest.remaining_secs(at(500)), 0);
    }

    #[test]
    fn remaining_never_exceeds_duration() {
        let rest = running_rest(60);
        // A reading from before the reference still caps at the configured duration.
        assert_eq!(rest.remaining_secs(at(-30)), 60);
    }

    #[test]
    fn elapsed_adds_banked_seconds_only_while_active() {
        let mut workout = TimerState {
            active: true,
            reference: Some(at(100)),
            banked_secs: 40,
            ..TimerState::workout()
        };
        assert_eq!(workout.elapsed_secs(at(160)), 100);
        workout.active = false;
        assert_eq!(workout.elapsed_secs(at(10_000)), 40);
    }

    #[test]
    fn clear_keeps_kind() {
        let mut rest = running_rest(30);
        rest.clear();
        assert_eq!(rest, TimerState::rest());
        assert_eq!(rest.target_instant(), None);
    }
}
