//! State management module
//!
//! The timer coordinator, the value types it is built from, and the host-side
//! application state that wires it to the HTTP surface and background tasks.

pub mod app_state;
pub mod coordinator;
pub mod diagnostics;
pub mod persisted;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, DisplayTick};
pub use coordinator::{CoordinatorSettings, CoordinatorStatus, Platform, TimerCoordinator, MAX_REST_SECONDS, MIN_REST_SECONDS};
pub use diagnostics::Diagnostics;
pub use persisted::PersistedTimers;
pub use timer_state::{TimerKind, TimerState};
