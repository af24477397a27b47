//! Utility functions module
//!
//! Lock recovery shared by the coordinator and its collaborators, and the
//! process signal handling used by the host binary.

pub mod signals;
pub mod sync;

// Re-export main functions
pub use signals::{lifecycle_signals, shutdown_signal};
pub use sync::lock;
