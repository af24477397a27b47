//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    events::{AlertAction, AlertId},
    state::{CoordinatorStatus, DisplayTick},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRestRequest {
    pub seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustRestRequest {
    pub delta: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinimizedRequest {
    pub minimized: bool,
}

/// A tapped alert action, as the platform would deliver it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationActionRequest {
    pub action: AlertAction,
    #[serde(default)]
    pub alert: Option<AlertId>,
}

/// Response for every state-changing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timers: TimersView,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: &str, message: impl Into<String>, timers: TimersView) -> Self {
        Self {
            status: status.to_string(),
            message: message.into(),
            timestamp: Utc::now(),
            timers,
        }
    }

    pub fn ok(message: impl Into<String>, timers: TimersView) -> Self {
        Self::new("ok", message, timers)
    }
}

/// Compact timer readings included in action responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimersView {
    pub workout_active: bool,
    pub elapsed_workout_seconds: u64,
    pub resting: bool,
    pub rest_remaining_seconds: u64,
    pub rest_ends_at: Option<DateTime<Utc>>,
}

impl From<&CoordinatorStatus> for TimersView {
    fn from(status: &CoordinatorStatus) -> Self {
        Self {
            workout_active: status.workout_active,
            elapsed_workout_seconds: status.elapsed_workout_seconds,
            resting: status.resting,
            rest_remaining_seconds: status.rest_remaining_seconds,
            rest_ends_at: status.rest_ends_at,
        }
    }
}

/// Full status with host metadata
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub coordinator: CoordinatorStatus,
    pub last_tick: DisplayTick,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
