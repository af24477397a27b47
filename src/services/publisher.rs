//! Live-status snapshots
//!
//! The publisher fans a `LiveSnapshot` out to in-process subscribers (watch
//! channel, always updated) and to the external live-status surface (best effort).

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::PlatformError;

/// What the lock-screen widget and the minimized bar render.
///
/// Instants are absolute so a surface can run its own countdown without
/// receiving a publish per second.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSnapshot {
    pub workout_name: String,
    pub current_exercise: String,
    pub is_resting: bool,
    pub rest_ends_at: Option<DateTime<Utc>>,
    /// Workout elapsed seconds when this snapshot was built
    pub elapsed_workout_seconds: u64,
    /// Wall instant the workout clock effectively counts up from, when running
    pub workout_counting_since: Option<DateTime<Utc>>,
    pub published_at: DateTime<Utc>,
    /// Assigned by the publisher, strictly increasing
    pub sequence: u64,
}

/// Outbound port to the OS live-status surface
pub trait LiveStatusSurface: Send + Sync {
    fn update(&self, snapshot: &LiveSnapshot) -> Result<(), PlatformError>;
    /// Dismiss the surface
    fn end(&self) -> Result<(), PlatformError>;
}

pub struct PresentationPublisher {
    surface: Arc<dyn LiveStatusSurface>,
    snapshot_tx: watch::Sender<LiveSnapshot>,
    sequence: AtomicU64,
}

impl PresentationPublisher {
    pub fn new(surface: Arc<dyn LiveStatusSurface>) -> Self {
        let (snapshot_tx, _) = watch::channel(LiveSnapshot::default());
        Self {
            surface,
            snapshot_tx,
            sequence: AtomicU64::new(0),
        }
    }

    /// Publish a snapshot. In-process subscribers always see it; a surface
    /// failure is returned for the caller to record and has no other effect.
    pub fn publish(&self, mut snapshot: LiveSnapshot) -> Result<(), PlatformError> {
        snapshot.sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            "Publishing snapshot #{}: resting={}, exercise={:?}",
            snapshot.sequence, snapshot.is_resting, snapshot.current_exercise
        );
        let result = self.surface.update(&snapshot);
        if let Err(e) = &result {
            warn!("Live-status surface rejected snapshot #{}: {}", snapshot.sequence, e);
        }
        self.snapshot_tx.send_replace(snapshot);
        result
    }

    /// Show `idle` in-process and dismiss the external surface
    pub fn end(&self, mut idle: LiveSnapshot) -> Result<(), PlatformError> {
        idle.sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        self.snapshot_tx.send_replace(idle);
        self.surface.end().inspect_err(|e| warn!("Failed to dismiss live-status surface: {}", e))
    }

    pub fn subscribe(&self) -> watch::Receiver<LiveSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn latest(&self) -> LiveSnapshot {
        self.snapshot_tx.borrow().clone()
    }
}
