//! Host application state shared by the HTTP handlers and background tasks

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::{events::PlatformEvent, utils::lock};

use super::TimerCoordinator;

/// Display-only reading pushed by the countdown ticker. Never fed back into timing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayTick {
    pub elapsed_workout_seconds: u64,
    pub rest_remaining_seconds: u64,
    pub resting: bool,
    pub at: Option<DateTime<Utc>>,
}

/// Everything the host binary shares between its tasks
pub struct AppState {
    pub coordinator: Arc<TimerCoordinator>,
    /// Inbound platform callbacks, drained by the event router
    pub events_tx: mpsc::UnboundedSender<PlatformEvent>,
    /// Latest display tick
    pub tick_tx: watch::Sender<DisplayTick>,
    /// Where timer state is saved for eviction survival
    pub state_file: Option<PathBuf>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    pub fn new(
        coordinator: Arc<TimerCoordinator>,
        events_tx: mpsc::UnboundedSender<PlatformEvent>,
        state_file: Option<PathBuf>,
        port: u16,
        host: String,
    ) -> Self {
        let (tick_tx, _) = watch::channel(DisplayTick::default());
        Self {
            coordinator,
            events_tx,
            tick_tx,
            state_file,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
        }
    }

    /// Remember the last UI action for the status endpoint
    pub fn record_action(&self, action: &str) {
        debug!("Action: {}", action);
        *lock(&self.last_action) = Some((action.to_string(), Utc::now()));
    }

    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match lock(&self.last_action).clone() {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }

    /// Queue a platform event for the router
    pub fn send_event(&self, event: PlatformEvent) -> Result<(), String> {
        self.events_tx
            .send(event)
            .map_err(|e| format!("Event router is gone: {}", e))
    }

    pub fn latest_tick(&self) -> DisplayTick {
        self.tick_tx.borrow().clone()
    }

    pub fn subscribe_ticks(&self) -> watch::Receiver<DisplayTick> {
        self.tick_tx.subscribe()
    }

    /// Save the coordinator's timers if a state file is configured
    pub async fn persist(&self) -> anyhow::Result<()> {
        let Some(path) = &self.state_file else {
            return Ok(());
        };
        self.coordinator.persisted().save(path).await?;
        debug!("Timer state saved to {}", path.display());
        Ok(())
    }

    /// Persist, logging instead of failing
    pub async fn persist_or_warn(&self) {
        if let Err(e) = self.persist().await {
            warn!("Failed to save timer state: {:#}", e);
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
