//! Mutex helpers

use std::sync::{Mutex, MutexGuard};
use tracing::warn;

/// Lock a mutex, recovering the data if a previous holder panicked.
///
/// Timer state stays valid across a panic (every write is a whole-field
/// assignment), so a poisoned lock is not a reason to stop serving reads.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("Recovering poisoned lock");
        poisoned.into_inner()
    })
}
