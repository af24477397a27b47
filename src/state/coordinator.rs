//! Workout and rest timer coordinator
//!
//! The single source of truth every view reads. All mutations go through one
//! mutex; the notifier, guard and publisher are called while it is held and
//! never call back in, so the lock order is always coordinator first.

use std::sync::{Arc, Mutex, MutexGuard};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    clock::{Clock, MonoInstant},
    error::PlatformError,
    events::{AlertAction, AlertId, GraceHandle, PlatformEvent},
    services::{
        AlertRequest, AlertScheduler, BackgroundExecutionGuard, ExpiryNotifier, GraceProvider,
        LiveSnapshot, LiveStatusSurface, PresentationPublisher,
    },
    utils::lock,
};

use super::{Diagnostics, PersistedTimers, TimerState};

/// Shortest rest a user can start; non-positive requests are raised to this
pub const MIN_REST_SECONDS: u64 = 1;

/// Longest rest the coordinator will hold; longer requests and adjustments are capped
pub const MAX_REST_SECONDS: u64 = 24 * 60 * 60;

const NOTIFIER: &str = "notifier";
const GRACE: &str = "grace";
const LIVE_STATUS: &str = "live-status";

/// Tunables for the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorSettings {
    /// Seconds added by the alert's add-time action
    pub add_time_seconds: i64,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self { add_time_seconds: 30 }
    }
}

/// The OS-facing ports the coordinator drives
#[derive(Clone)]
pub struct Platform {
    pub alerts: Arc<dyn AlertScheduler>,
    pub grace: Arc<dyn GraceProvider>,
    pub surface: Arc<dyn LiveStatusSurface>,
}

/// Point-in-time view of the coordinator, for status endpoints and logs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinatorStatus {
    pub workout_active: bool,
    pub elapsed_workout_seconds: u64,
    pub resting: bool,
    pub rest_remaining_seconds: u64,
    pub rest_duration_seconds: Option<u64>,
    pub rest_ends_at: Option<DateTime<Utc>>,
    pub workout_name: String,
    pub current_exercise: String,
    pub minimized: bool,
    pub epoch: u64,
    pub pending_alert: Option<AlertId>,
    pub grace: Option<GraceHandle>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug)]
struct CoordinatorInner {
    workout: TimerState,
    rest: TimerState,
    /// Bumped by cleanup; async work issued under an older epoch is stale
    epoch: u64,
    /// Bumped by every new rest timer
    rest_generation: u64,
    workout_name: String,
    current_exercise: String,
    diagnostics: Diagnostics,
}

impl CoordinatorInner {
    fn new() -> Self {
        Self {
            workout: TimerState::workout(),
            rest: TimerState::rest(),
            epoch: 0,
            rest_generation: 0,
            workout_name: String::new(),
            current_exercise: String::new(),
            diagnostics: Diagnostics::new(),
        }
    }
}

pub struct TimerCoordinator {
    clock: Arc<dyn Clock>,
    settings: CoordinatorSettings,
    inner: Mutex<CoordinatorInner>,
    notifier: ExpiryNotifier,
    guard: BackgroundExecutionGuard,
    publisher: PresentationPublisher,
    minimized: watch::Sender<bool>,
}

impl TimerCoordinator {
    pub fn new(clock: Arc<dyn Clock>, platform: Platform, settings: CoordinatorSettings) -> Self {
        let (minimized, _) = watch::channel(false);
        Self {
            clock,
            settings,
            inner: Mutex::new(CoordinatorInner::new()),
            notifier: ExpiryNotifier::new(platform.alerts),
            guard: BackgroundExecutionGuard::new(platform.grace),
            publisher: PresentationPublisher::new(platform.surface),
            minimized,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorInner> {
        lock(&self.inner)
    }

    // ── Workout timer ────────────────────────────────────────────────

    /// Start the workout clock. No-op while it is already running.
    pub fn start_workout_timer(&self) {
        let mut inner = self.lock();
        if inner.workout.active {
            debug!("Workout timer already running");
            return;
        }
        let now = self.clock.now();
        inner.workout = TimerState {
            active: true,
            reference: Some(now),
            banked_secs: 0,
            ..TimerState::workout()
        };
        info!("Workout timer started");
        self.publish_locked(&mut inner, now);
    }

    /// Stop the workout clock, keeping the elapsed time readable
    pub fn stop_workout_timer(&self) {
        let mut inner = self.lock();
        if !inner.workout.active {
            return;
        }
        let now = self.clock.now();
        inner.workout.banked_secs = inner.workout.elapsed_secs(now);
        inner.workout.active = false;
        inner.workout.reference = None;
        info!("Workout timer stopped at {}s", inner.workout.banked_secs);
        self.publish_locked(&mut inner, now);
    }

    /// Continue a stopped workout clock from its banked time
    pub fn resume_workout_timer(&self) {
        let mut inner = self.lock();
        if inner.workout.active {
            return;
        }
        let now = self.clock.now();
        inner.workout.active = true;
        inner.workout.reference = Some(now);
        info!("Workout timer resumed from {}s", inner.workout.banked_secs);
        self.publish_locked(&mut inner, now);
    }

    pub fn elapsed_workout_seconds(&self) -> u64 {
        self.lock().workout.elapsed_secs(self.clock.now())
    }

    pub fn is_workout_active(&self) -> bool {
        self.lock().workout.active
    }

    // ── Rest timer ───────────────────────────────────────────────────

    /// Start a rest countdown, replacing any running one.
    ///
    /// Durations are clamped to `MIN_REST_SECONDS..=MAX_REST_SECONDS`.
    pub fn start_rest_timer(&self, seconds: i64) {
        let seconds = clamp_rest_seconds(seconds);
        let mut inner = self.lock();
        let now = self.clock.now();

        if inner.rest.active {
            info!("Replacing running rest timer");
        }
        inner.rest_generation += 1;
        inner.rest = TimerState {
            active: true,
            reference: Some(now),
            target_duration_secs: Some(seconds),
            ..TimerState::rest()
        };
        info!("Rest timer started for {}s", seconds);

        self.arm_alert_locked(&mut inner, now);
        self.publish_locked(&mut inner, now);
    }

    /// Shift the rest target by `delta` seconds. Ends the rest if that leaves
    /// nothing remaining; no-op when no rest is running.
    pub fn adjust_rest_time(&self, delta: i64) {
        let mut inner = self.lock();
        self.adjust_rest_locked(&mut inner, delta);
    }

    /// End the rest early. Safe to call any number of times.
    pub fn end_rest_timer(&self) {
        let mut inner = self.lock();
        if inner.rest.active {
            info!("Rest timer ended early");
            let now = self.clock.now();
            self.finish_rest_locked(&mut inner, now);
        }
    }

    /// Seconds left on the rest timer, rounded up. Reading zero expires the timer.
    pub fn rest_time_remaining_seconds(&self) -> u64 {
        let mut inner = self.lock();
        let now = self.clock.now();
        self.expire_rest_if_due(&mut inner, now);
        inner.rest.remaining_secs(now)
    }

    pub fn is_resting(&self) -> bool {
        let mut inner = self.lock();
        let now = self.clock.now();
        self.expire_rest_if_due(&mut inner, now);
        inner.rest.active
    }

    /// Total duration of the running rest, adjustments included
    pub fn rest_duration_seconds(&self) -> Option<u64> {
        let inner = self.lock();
        inner.rest.target_duration_secs.filter(|_| inner.rest.active)
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn update_current_exercise(&self, name: impl Into<String>) {
        let name = name.into();
        let mut inner = self.lock();
        if inner.current_exercise != name {
            debug!("Current exercise: {:?}", name);
            inner.current_exercise = name;
            let now = self.clock.now();
            self.publish_locked(&mut inner, now);
        }
    }

    pub fn update_workout_name(&self, name: impl Into<String>) {
        let name = name.into();
        let mut inner = self.lock();
        if inner.workout_name != name {
            debug!("Workout name: {:?}", name);
            inner.workout_name = name;
            let now = self.clock.now();
            self.publish_locked(&mut inner, now);
        }
    }

    /// Whether the UI shows the compact bar instead of the full workout view.
    /// Independent of timing: a minimized workout keeps running.
    pub fn is_minimized(&self) -> bool {
        *self.minimized.borrow()
    }

    pub fn set_minimized(&self, minimized: bool) {
        self.minimized.send_if_modified(|current| {
            let changed = *current != minimized;
            *current = minimized;
            changed
        });
    }

    pub fn subscribe_minimized(&self) -> watch::Receiver<bool> {
        self.minimized.subscribe()
    }

    // ── Snapshots ────────────────────────────────────────────────────

    pub fn subscribe(&self) -> watch::Receiver<LiveSnapshot> {
        self.publisher.subscribe()
    }

    pub fn latest_snapshot(&self) -> LiveSnapshot {
        self.publisher.latest()
    }

    pub fn status(&self) -> CoordinatorStatus {
        let mut inner = self.lock();
        let now = self.clock.now();
        self.expire_rest_if_due(&mut inner, now);
        CoordinatorStatus {
            workout_active: inner.workout.active,
            elapsed_workout_seconds: inner.workout.elapsed_secs(now),
            resting: inner.rest.active,
            rest_remaining_seconds: inner.rest.remaining_secs(now),
            rest_duration_seconds: inner.rest.target_duration_secs.filter(|_| inner.rest.active),
            rest_ends_at: self.rest_ends_at(&inner),
            workout_name: inner.workout_name.clone(),
            current_exercise: inner.current_exercise.clone(),
            minimized: self.is_minimized(),
            epoch: inner.epoch,
            pending_alert: self.notifier.pending(),
            grace: self.guard.outstanding(),
            diagnostics: inner.diagnostics.clone(),
        }
    }

    pub fn pending_alert(&self) -> Option<AlertId> {
        self.notifier.pending()
    }

    pub fn outstanding_grace(&self) -> Option<GraceHandle> {
        self.guard.outstanding()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.lock().diagnostics.clone()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Stop everything and cancel all outstanding platform work.
    ///
    /// Bumps the epoch, so callbacks still in flight are dropped on arrival.
    pub fn cleanup(&self) {
        let mut inner = self.lock();
        let was_running = inner.workout.active || inner.rest.active;

        inner.workout.clear();
        inner.rest.clear();
        inner.workout_name.clear();
        inner.current_exercise.clear();
        inner.epoch += 1;

        self.notifier.cancel();
        self.guard.release();
        self.set_minimized(false);

        let idle = LiveSnapshot {
            published_at: self.clock.wall_now(),
            ..LiveSnapshot::default()
        };
        if let Err(e) = self.publisher.end(idle) {
            inner.diagnostics.record(LIVE_STATUS, e);
        }

        if was_running {
            info!("Timers cleaned up, epoch now {}", inner.epoch);
        } else {
            debug!("Cleanup with nothing running, epoch now {}", inner.epoch);
        }
    }

    /// Re-read both timers against the clock, re-arm a missing alert and republish
    pub fn reconcile(&self) {
        let mut inner = self.lock();
        self.reconcile_locked(&mut inner);
    }

    /// Single entry point for everything the platform reports asynchronously
    pub fn handle_event(&self, event: PlatformEvent) {
        let mut inner = self.lock();
        match event {
            PlatformEvent::AppBackgrounded => self.enter_background_locked(&mut inner),
            PlatformEvent::AppForegrounded => {
                if let Some(handle) = self.guard.outstanding() {
                    self.guard.end_grace(handle);
                }
                info!("App foregrounded, reconciling timers");
                self.reconcile_locked(&mut inner);
            }
            PlatformEvent::GraceExpired(handle) => {
                if handle.epoch != inner.epoch {
                    debug!("Dropping grace expiry for grant {} from epoch {}", handle.id, handle.epoch);
                    return;
                }
                if self.guard.end_grace(handle) {
                    info!("Background grace grant {} expired", handle.id);
                }
            }
            PlatformEvent::AlertDelivered(id) => {
                if id.epoch != inner.epoch {
                    debug!("Dropping delivery of alert {} from epoch {}", id, id.epoch);
                    return;
                }
                self.notifier.on_delivered(id);
                let now = self.clock.now();
                if !self.expire_rest_if_due(&mut inner, now) && inner.rest.active {
                    debug!("Alert {} delivered with {}s still on the clock", id, inner.rest.remaining_secs(now));
                }
            }
            PlatformEvent::NotificationAction { action, alert } => {
                if let Some(id) = alert {
                    if !id.belongs_to(inner.epoch, inner.rest_generation) {
                        debug!("Dropping {} from stale alert {}", action, id);
                        return;
                    }
                }
                info!("Alert action {}", action);
                match action {
                    AlertAction::Skip => {
                        if inner.rest.active {
                            let now = self.clock.now();
                            self.finish_rest_locked(&mut inner, now);
                        }
                    }
                    AlertAction::AddTime => {
                        self.adjust_rest_locked(&mut inner, self.settings.add_time_seconds);
                    }
                }
            }
        }
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Export the timers in a form that survives process death
    pub fn persisted(&self) -> PersistedTimers {
        let mut inner = self.lock();
        let now = self.clock.now();
        self.expire_rest_if_due(&mut inner, now);

        let rest_running = inner.rest.active;
        PersistedTimers {
            epoch: inner.epoch,
            rest_generation: inner.rest_generation,
            workout_active: inner.workout.active,
            workout_started_at: inner
                .workout
                .reference
                .filter(|_| inner.workout.active)
                .map(|reference| self.clock.to_wall(reference)),
            workout_banked_seconds: inner.workout.banked_secs,
            rest_started_at: inner
                .rest
                .reference
                .filter(|_| rest_running)
                .map(|reference| self.clock.to_wall(reference)),
            rest_duration_seconds: inner.rest.target_duration_secs.filter(|_| rest_running),
            workout_name: inner.workout_name.clone(),
            current_exercise: inner.current_exercise.clone(),
            saved_at: Some(self.clock.wall_now()),
        }
    }

    /// Reattach to timers saved by a previous process.
    ///
    /// Keeps the saved epoch and rest generation so actions on alerts issued by
    /// that process are still honoured. A rest that ran out meanwhile is expired.
    pub fn restore(&self, saved: PersistedTimers) {
        let mut inner = self.lock();
        let now = self.clock.now();

        inner.epoch = saved.epoch;
        inner.rest_generation = saved.rest_generation;
        inner.workout_name = saved.workout_name;
        inner.current_exercise = saved.current_exercise;

        inner.workout = TimerState {
            active: saved.workout_active && saved.workout_started_at.is_some(),
            reference: saved.workout_started_at.map(|at| self.anchor(at, now)),
            banked_secs: saved.workout_banked_seconds,
            ..TimerState::workout()
        };

        inner.rest = match (saved.rest_started_at, saved.rest_duration_seconds) {
            (Some(started_at), Some(duration)) => TimerState {
                active: true,
                reference: Some(self.anchor(started_at, now)),
                target_duration_secs: Some(duration.clamp(MIN_REST_SECONDS, MAX_REST_SECONDS)),
                ..TimerState::rest()
            },
            _ => TimerState::rest(),
        };

        info!(
            "Restored timers: workout={}s, rest_remaining={}s, epoch={}",
            inner.workout.elapsed_secs(now),
            inner.rest.remaining_secs(now),
            inner.epoch
        );
        self.reconcile_locked(&mut inner);
    }

    /// Map a saved wall instant onto this process's monotonic clock, never
    /// into the future (the device clock may have been moved back)
    fn anchor(&self, at: DateTime<Utc>, now: MonoInstant) -> MonoInstant {
        self.clock.from_wall(at).min(now)
    }

    // ── Internals (coordinator lock held) ────────────────────────────

    fn adjust_rest_locked(&self, inner: &mut CoordinatorInner, delta: i64) {
        let now = self.clock.now();
        if self.expire_rest_if_due(inner, now) || !inner.rest.active {
            debug!("No running rest timer to adjust");
            return;
        }
        let (Some(target), Some(duration)) = (inner.rest.target_instant(), inner.rest.target_duration_secs) else {
            return;
        };

        let remaining_ms = target.millis_since(now);
        if remaining_ms.saturating_add(delta.saturating_mul(1000)) <= 0 {
            info!("Rest adjustment of {}s leaves nothing remaining, ending rest", delta);
            self.finish_rest_locked(inner, now);
            return;
        }

        // The duration moves with the target so remaining never exceeds it.
        let duration = clamp_rest_seconds((duration as i64).saturating_add(delta));
        inner.rest.target_duration_secs = Some(duration);
        info!("Rest adjusted by {}s, {}s remaining", delta, inner.rest.remaining_secs(now));

        self.arm_alert_locked(inner, now);
        self.publish_locked(inner, now);
    }

    /// Expire the rest timer if its remaining time has reached zero.
    /// Returns true when this call did the expiring.
    fn expire_rest_if_due(&self, inner: &mut CoordinatorInner, now: MonoInstant) -> bool {
        if !inner.rest.active {
            return false;
        }
        match inner.rest.target_instant() {
            Some(target) if now >= target => {
                info!("Rest timer finished");
                self.finish_rest_locked(inner, now);
                true
            }
            _ => false,
        }
    }

    fn finish_rest_locked(&self, inner: &mut CoordinatorInner, now: MonoInstant) {
        inner.rest.clear();
        self.notifier.cancel();
        self.publish_locked(inner, now);
    }

    fn enter_background_locked(&self, inner: &mut CoordinatorInner) {
        let now = self.clock.now();
        self.expire_rest_if_due(inner, now);

        match self.guard.begin_grace(inner.epoch) {
            Ok(handle) => {
                debug!("Backgrounded under grace grant {}", handle.id);
                inner.diagnostics.clear_for(GRACE);
            }
            Err((_, e)) => inner.diagnostics.record(GRACE, e),
        }

        if inner.rest.active && self.notifier.pending().is_none() {
            self.arm_alert_locked(inner, now);
        }
        self.publish_locked(inner, now);
        info!("App backgrounded");
    }

    fn reconcile_locked(&self, inner: &mut CoordinatorInner) {
        let now = self.clock.now();
        self.expire_rest_if_due(inner, now);
        if inner.rest.active && self.notifier.pending().is_none() {
            warn!("Running rest timer had no alert pending, re-arming");
            self.arm_alert_locked(inner, now);
        }
        self.publish_locked(inner, now);
    }

    fn arm_alert_locked(&self, inner: &mut CoordinatorInner, now: MonoInstant) {
        let Some(target) = inner.rest.target_instant() else {
            return;
        };
        let body = if inner.current_exercise.is_empty() {
            "Rest complete".to_string()
        } else {
            format!("Rest complete. Next up: {}", inner.current_exercise)
        };
        let title = if inner.workout_name.is_empty() {
            "Rest timer".to_string()
        } else {
            inner.workout_name.clone()
        };
        let request = AlertRequest {
            id: AlertId {
                epoch: inner.epoch,
                generation: inner.rest_generation,
                revision: 0,
            },
            target,
            fire_at: self.clock.to_wall(target),
            fire_in: target.saturating_since(now),
            title,
            body,
            actions: AlertAction::ALL,
        };

        match self.notifier.reschedule(request) {
            Ok(_) => inner.diagnostics.clear_for(NOTIFIER),
            Err(e) => self.record_failure(inner, NOTIFIER, e),
        }
    }

    fn publish_locked(&self, inner: &mut CoordinatorInner, now: MonoInstant) {
        let workout_elapsed = inner.workout.elapsed_secs(now);
        let snapshot = LiveSnapshot {
            workout_name: inner.workout_name.clone(),
            current_exercise: inner.current_exercise.clone(),
            is_resting: inner.rest.active,
            rest_ends_at: self.rest_ends_at(inner),
            elapsed_workout_seconds: workout_elapsed,
            workout_counting_since: inner
                .workout
                .active
                .then(|| self.clock.to_wall(now.plus_secs(-(workout_elapsed as i64)))),
            published_at: self.clock.wall_now(),
            sequence: 0,
        };
        match self.publisher.publish(snapshot) {
            Ok(()) => inner.diagnostics.clear_for(LIVE_STATUS),
            Err(e) => self.record_failure(inner, LIVE_STATUS, e),
        }
    }

    fn rest_ends_at(&self, inner: &CoordinatorInner) -> Option<DateTime<Utc>> {
        inner
            .rest
            .target_instant()
            .filter(|_| inner.rest.active)
            .map(|target| self.clock.to_wall(target))
    }

    fn record_failure(&self, inner: &mut CoordinatorInner, component: &str, error: PlatformError) {
        debug!("Recording {} failure: {}", component, error);
        inner.diagnostics.record(component, error);
    }
}

fn clamp_rest_seconds(seconds: i64) -> u64 {
    u64::try_from(seconds)
        .unwrap_or(0)
        .clamp(MIN_REST_SECONDS, MAX_REST_SECONDS)
}
