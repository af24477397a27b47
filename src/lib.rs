//! Workout Timer - workout and rest timer coordination
//!
//! This library tracks an ascending workout timer and a descending rest
//! countdown that stay correct across suspension, schedules the rest-over alert
//! with the platform, and publishes snapshots for a live-status surface.

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, MonoInstant, SystemClock};
pub use config::Config;
pub use error::PlatformError;
pub use events::{AlertAction, AlertId, GraceHandle, PlatformEvent};
pub use services::LiveSnapshot;
pub use state::{AppState, CoordinatorSettings, Platform, TimerCoordinator};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
