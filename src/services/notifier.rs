//! Rest-over alert scheduling
//!
//! The notifier owns a single logical slot. Every reschedule cancels whatever
//! occupies the slot before handing the new alert to the platform, under one lock.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::{
    clock::MonoInstant,
    error::PlatformError,
    events::{AlertAction, AlertId},
    utils::lock,
};

/// Everything the platform needs to deliver one local alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRequest {
    /// Revision is assigned by the notifier
    pub id: AlertId,
    /// When the rest timer reaches zero, on the coordinator's clock
    pub target: MonoInstant,
    /// Same instant on the wall clock, for platforms that schedule by date
    pub fire_at: DateTime<Utc>,
    /// Same instant as a delay from now, for platforms that schedule by interval
    pub fire_in: Duration,
    pub title: String,
    pub body: String,
    pub actions: [AlertAction; 2],
}

/// Outbound port to the OS local-notification service.
///
/// Implementations must not call back into the coordinator synchronously;
/// deliveries are reported as `PlatformEvent::AlertDelivered`.
pub trait AlertScheduler: Send + Sync {
    fn schedule(&self, request: &AlertRequest) -> Result<(), PlatformError>;
    fn cancel(&self, id: AlertId);
}

#[derive(Debug, Clone, Copy)]
struct PendingAlert {
    id: AlertId,
    target: MonoInstant,
}

pub struct ExpiryNotifier {
    scheduler: Arc<dyn AlertScheduler>,
    slot: Mutex<Option<PendingAlert>>,
    next_revision: AtomicU64,
}

impl ExpiryNotifier {
    pub fn new(scheduler: Arc<dyn AlertScheduler>) -> Self {
        Self {
            scheduler,
            slot: Mutex::new(None),
            next_revision: AtomicU64::new(0),
        }
    }

    /// Replace the pending alert with `request`.
    ///
    /// A request for the same rest timer and the same target is a no-op, so
    /// repeated calls cannot stack. If the platform refuses, the slot is left
    /// empty and the error is returned for the caller to record.
    pub fn reschedule(&self, mut request: AlertRequest) -> Result<AlertId, PlatformError> {
        let mut slot = lock(&self.slot);

        if let Some(pending) = *slot {
            if pending.id.belongs_to(request.id.epoch, request.id.generation) && pending.target == request.target {
                debug!("Alert {} already scheduled for this target", pending.id);
                return Ok(pending.id);
            }
        }

        if let Some(previous) = slot.take() {
            debug!("Cancelling alert {} before rescheduling", previous.id);
            self.scheduler.cancel(previous.id);
        }

        request.id.revision = self.next_revision.fetch_add(1, Ordering::Relaxed);

        match self.scheduler.schedule(&request) {
            Ok(()) => {
                info!("Scheduled alert {} in {}s", request.id, request.fire_in.as_secs());
                *slot = Some(PendingAlert {
                    id: request.id,
                    target: request.target,
                });
                Ok(request.id)
            }
            Err(e) => {
                warn!("Failed to schedule alert {}: {}", request.id, e);
                Err(e)
            }
        }
    }

    /// Remove the pending alert, if any
    pub fn cancel(&self) {
        let mut slot = lock(&self.slot);
        if let Some(pending) = slot.take() {
            info!("Cancelled alert {}", pending.id);
            self.scheduler.cancel(pending.id);
        }
    }

    /// Forget the slot after the platform delivered its alert.
    /// Returns false for a delivery that no longer matches the slot.
    pub fn on_delivered(&self, id: AlertId) -> bool {
        let mut slot = lock(&self.slot);
        match *slot {
            Some(pending) if pending.id == id => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    pub fn pending(&self) -> Option<AlertId> {
        lock(&self.slot).map(|pending| pending.id)
    }
}
