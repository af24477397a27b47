//! Inbound platform events
//!
//! Everything the OS can tell the coordinator asynchronously is one of these
//! messages, routed through `TimerCoordinator::handle_event`.

use std::{fmt, str::FromStr};
use serde::{Deserialize, Serialize};

/// Action identifiers attached to the rest-over alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertAction {
    #[serde(rename = "SKIP_ACTION")]
    Skip,
    #[serde(rename = "ADD_TIME_ACTION")]
    AddTime,
}

impl AlertAction {
    pub const ALL: [AlertAction; 2] = [AlertAction::Skip, AlertAction::AddTime];

    pub fn identifier(&self) -> &'static str {
        match self {
            AlertAction::Skip => "SKIP_ACTION",
            AlertAction::AddTime => "ADD_TIME_ACTION",
        }
    }

    /// Button text shown on the alert
    pub fn label(&self) -> &'static str {
        match self {
            AlertAction::Skip => "Skip rest",
            AlertAction::AddTime => "Add time",
        }
    }
}

impl fmt::Display for AlertAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for AlertAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SKIP_ACTION" => Ok(AlertAction::Skip),
            "ADD_TIME_ACTION" => Ok(AlertAction::AddTime),
            other => Err(format!("Unknown alert action: {}", other)),
        }
    }
}

/// Identity of one scheduled rest-over alert.
///
/// `epoch` changes on cleanup, `generation` on every new rest timer and
/// `revision` on every reschedule of the same rest timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId {
    pub epoch: u64,
    pub generation: u64,
    pub revision: u64,
}

impl AlertId {
    /// Whether this alert was issued for the given rest timer, ignoring reschedules
    pub fn belongs_to(&self, epoch: u64, generation: u64) -> bool {
        self.epoch == epoch && self.generation == generation
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rest-{}-{}-{}", self.epoch, self.generation, self.revision)
    }
}

/// Token for one background-execution grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraceHandle {
    pub id: u64,
    pub epoch: u64,
    /// False when the platform refused the grant; such a handle has nothing to release
    pub granted: bool,
}

/// Callbacks arriving from the platform on arbitrary threads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    /// The app is about to stop being scheduled
    AppBackgrounded,
    /// The app is active again
    AppForegrounded,
    /// The OS revoked a background grant
    GraceExpired(GraceHandle),
    /// A scheduled alert was delivered to the user
    AlertDelivered(AlertId),
    /// The user tapped an action on a delivered alert. `alert` is absent when
    /// the platform could not say which alert it came from.
    NotificationAction {
        action: AlertAction,
        alert: Option<AlertId>,
    },
}
