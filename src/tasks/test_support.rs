//! Host state over a manual clock and no-op platform ports

use std::{path::PathBuf, sync::Arc};
use tokio::sync::mpsc;

use crate::{
    clock::ManualClock,
    error::PlatformError,
    events::{AlertId, GraceHandle},
    services::{AlertRequest, AlertScheduler, GraceProvider, LiveSnapshot, LiveStatusSurface},
    state::{AppState, CoordinatorSettings, Platform, TimerCoordinator},
};

struct Quiet;

impl AlertScheduler for Quiet {
    fn schedule(&self, _: &AlertRequest) -> Result<(), PlatformError> {
        Ok(())
    }
    fn cancel(&self, _: AlertId) {}
}

impl GraceProvider for Quiet {
    fn begin(&self, _: GraceHandle) -> Result<(), PlatformError> {
        Ok(())
    }
    fn end(&self, _: GraceHandle) {}
}

impl LiveStatusSurface for Quiet {
    fn update(&self, _: &LiveSnapshot) -> Result<(), PlatformError> {
        Ok(())
    }
    fn end(&self) -> Result<(), PlatformError> {
        Ok(())
    }
}

pub fn host(state_file: Option<PathBuf>) -> (Arc<ManualClock>, Arc<AppState>) {
    let clock = Arc::new(ManualClock::default());
    let quiet = Arc::new(Quiet);
    let platform = Platform {
        alerts: quiet.clone(),
        grace: quiet.clone(),
        surface: quiet,
    };
    let coordinator = Arc::new(TimerCoordinator::new(clock.clone(), platform, CoordinatorSettings::default()));
    let (events_tx, _) = mpsc::unbounded_channel();
    let state = Arc::new(AppState::new(coordinator, events_tx, state_file, 20554, "127.0.0.1".to_string()));
    (clock, state)
}
