//! Recording fakes for the platform ports and a harness wiring them to a coordinator
#![allow(dead_code)]

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use workout_timer::{
    clock::ManualClock,
    error::PlatformError,
    events::{AlertId, GraceHandle},
    services::{AlertRequest, AlertScheduler, GraceProvider, LiveSnapshot, LiveStatusSurface},
    state::{CoordinatorSettings, Platform, TimerCoordinator},
};

#[derive(Default)]
pub struct RecordingAlerts {
    pending: Mutex<BTreeMap<String, AlertRequest>>,
    scheduled_total: AtomicUsize,
    refuse: AtomicBool,
}

impl RecordingAlerts {
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn pending(&self) -> Vec<AlertRequest> {
        self.pending.lock().unwrap().values().cloned().collect()
    }

    pub fn scheduled_total(&self) -> usize {
        self.scheduled_total.load(Ordering::SeqCst)
    }

    pub fn refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }
}

impl AlertScheduler for RecordingAlerts {
    fn schedule(&self, request: &AlertRequest) -> Result<(), PlatformError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(PlatformError::PermissionDenied("notifications disabled".into()));
        }
        self.scheduled_total.fetch_add(1, Ordering::SeqCst);
        self.pending.lock().unwrap().insert(request.id.to_string(), request.clone());
        Ok(())
    }

    fn cancel(&self, id: AlertId) {
        self.pending.lock().unwrap().remove(&id.to_string());
    }
}

#[derive(Default)]
pub struct RecordingGrace {
    active: Mutex<BTreeSet<u64>>,
    begun: AtomicUsize,
}

impl RecordingGrace {
    pub fn active_count(&self) -> usize {
        self.active.lock().unwrap().len()
    }

    pub fn begun(&self) -> usize {
        self.begun.load(Ordering::SeqCst)
    }
}

impl GraceProvider for RecordingGrace {
    fn begin(&self, handle: GraceHandle) -> Result<(), PlatformError> {
        self.begun.fetch_add(1, Ordering::SeqCst);
        self.active.lock().unwrap().insert(handle.id);
        Ok(())
    }

    fn end(&self, handle: GraceHandle) {
        self.active.lock().unwrap().remove(&handle.id);
    }
}

#[derive(Default)]
pub struct RecordingSurface {
    updates: Mutex<Vec<LiveSnapshot>>,
    ended: AtomicUsize,
    unsupported: AtomicBool,
}

impl RecordingSurface {
    pub fn updates(&self) -> Vec<LiveSnapshot> {
        self.updates.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<LiveSnapshot> {
        self.updates.lock().unwrap().last().cloned()
    }

    pub fn ended(&self) -> usize {
        self.ended.load(Ordering::SeqCst)
    }

    pub fn set_unsupported(&self, unsupported: bool) {
        self.unsupported.store(unsupported, Ordering::SeqCst);
    }
}

impl LiveStatusSurface for RecordingSurface {
    fn update(&self, snapshot: &LiveSnapshot) -> Result<(), PlatformError> {
        if self.unsupported.load(Ordering::SeqCst) {
            return Err(PlatformError::Unsupported);
        }
        self.updates.lock().unwrap().push(snapshot.clone());
        Ok(())
    }

    fn end(&self) -> Result<(), PlatformError> {
        self.ended.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub alerts: Arc<RecordingAlerts>,
    pub grace: Arc<RecordingGrace>,
    pub surface: Arc<RecordingSurface>,
    pub coordinator: Arc<TimerCoordinator>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(ManualClock::default()))
    }

    pub fn with_clock(clock: Arc<ManualClock>) -> Self {
        let alerts = Arc::new(RecordingAlerts::default());
        let grace = Arc::new(RecordingGrace::default());
        let surface = Arc::new(RecordingSurface::default());
        let platform = Platform {
            alerts: alerts.clone(),
            grace: grace.clone(),
            surface: surface.clone(),
        };
        let coordinator = Arc::new(TimerCoordinator::new(
            clock.clone(),
            platform,
            CoordinatorSettings::default(),
        ));
        Self {
            clock,
            alerts,
            grace,
            surface,
            coordinator,
        }
    }

    /// The single alert the platform currently holds
    pub fn only_alert(&self) -> AlertRequest {
        let pending = self.alerts.pending();
        assert_eq!(pending.len(), 1, "expected exactly one pending alert, got {:?}", pending);
        pending.into_iter().next().unwrap()
    }
}
