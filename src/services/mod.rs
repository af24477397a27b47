//! Platform collaborators module
//!
//! The three services the coordinator drives (alert scheduling, background grace,
//! live-status publishing), the ports they talk to the OS through, and the local
//! implementations of those ports used by the host binary.

pub mod background;
pub mod local;
pub mod notifier;
pub mod publisher;

// Re-export main types
pub use background::{BackgroundExecutionGuard, GraceProvider};
pub use notifier::{AlertRequest, AlertScheduler, ExpiryNotifier};
pub use publisher::{LiveSnapshot, LiveStatusSurface, PresentationPublisher};
