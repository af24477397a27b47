//! Background-execution grace grants
//!
//! At most one grant is outstanding. Both the caller (foreground transition) and
//! the platform (grant expiry) release through `end_grace`, serialized by one mutex.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use tracing::{debug, info, warn};

use crate::{error::PlatformError, events::GraceHandle, utils::lock};

/// Outbound port to the OS background-time service.
///
/// Expiry is reported as `PlatformEvent::GraceExpired`, never by calling back
/// into the guard directly.
pub trait GraceProvider: Send + Sync {
    fn begin(&self, handle: GraceHandle) -> Result<(), PlatformError>;
    fn end(&self, handle: GraceHandle);
}

pub struct BackgroundExecutionGuard {
    provider: Arc<dyn GraceProvider>,
    current: Mutex<Option<GraceHandle>>,
    next_id: AtomicU64,
}

impl BackgroundExecutionGuard {
    pub fn new(provider: Arc<dyn GraceProvider>) -> Self {
        Self {
            provider,
            current: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Request a grant, ending any grant still outstanding.
    ///
    /// A refused request still yields a handle, with `granted == false`;
    /// releasing it is a no-op.
    pub fn begin_grace(&self, epoch: u64) -> Result<GraceHandle, (GraceHandle, PlatformError)> {
        let mut current = lock(&self.current);

        if let Some(previous) = current.take() {
            debug!("Replacing outstanding grace grant {}", previous.id);
            self.provider.end(previous);
        }

        let mut handle = GraceHandle {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            epoch,
            granted: true,
        };

        match self.provider.begin(handle) {
            Ok(()) => {
                info!("Background grace grant {} started", handle.id);
                *current = Some(handle);
                Ok(handle)
            }
            Err(e) => {
                warn!("Background grace grant refused: {}", e);
                handle.granted = false;
                Err((handle, e))
            }
        }
    }

    /// Release `handle` if it is the outstanding grant. Stale or already
    /// released handles are ignored. Returns whether anything was released.
    pub fn end_grace(&self, handle: GraceHandle) -> bool {
        let mut current = lock(&self.current);
        match *current {
            Some(outstanding) if outstanding.id == handle.id => {
                *current = None;
                self.provider.end(outstanding);
                info!("Background grace grant {} ended", outstanding.id);
                true
            }
            _ => {
                debug!("Ignoring release of stale grace grant {}", handle.id);
                false
            }
        }
    }

    /// Release whatever is outstanding
    pub fn release(&self) {
        if let Some(handle) = self.outstanding() {
            self.end_grace(handle);
        }
    }

    pub fn outstanding(&self) -> Option<GraceHandle> {
        *lock(&self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[derive(Default)]
    struct Provider {
        begun: Mutex<Vec<u64>>,
        ended: Mutex<Vec<u64>>,
        deny: bool,
    }

    impl GraceProvider for Provider {
        fn begin(&self, handle: GraceHandle) -> Result<(), PlatformError> {
            if self.deny {
                return Err(PlatformError::PermissionDenied("background refresh disabled".into()));
            }
            self.begun.lock().unwrap().push(handle.id);
            Ok(())
        }

        fn end(&self, handle: GraceHandle) {
            self.ended.lock().unwrap().push(handle.id);
        }
    }

    #[test]
    fn begin_replaces_outstanding_grant() {
        let provider = Arc::new(Provider::default());
        let guard = BackgroundExecutionGuard::new(provider.clone());

        let first = guard.begin_grace(0).unwrap();
        let second = guard.begin_grace(0).unwrap();

        assert_eq!(*provider.begun.lock().unwrap(), vec![first.id, second.id]);
        assert_eq!(*provider.ended.lock().unwrap(), vec![first.id]);
        assert_eq!(guard.outstanding(), Some(second));
    }

    #[test]
    fn end_is_idempotent_and_ignores_stale_handles() {
        let provider = Arc::new(Provider::default());
        let guard = BackgroundExecutionGuard::new(provider.clone());

        let stale = guard.begin_grace(0).unwrap();
        let live = guard.begin_grace(0).unwrap();

        assert!(!guard.end_grace(stale));
        assert!(guard.end_grace(live));
        assert!(!guard.end_grace(live));
        assert_eq!(*provider.ended.lock().unwrap(), vec![stale.id, live.id]);
    }

    #[test]
    fn refused_grant_is_inert() {
        let provider = Arc::new(Provider { deny: true, ..Provider::default() });
        let guard = BackgroundExecutionGuard::new(provider.clone());

        let (handle, _) = guard.begin_grace(0).unwrap_err();
        assert!(!handle.granted);
        assert_eq!(guard.outstanding(), None);
        assert!(!guard.end_grace(handle));
        assert!(provider.ended.lock().unwrap().is_empty());
    }

    #[test]
    fn concurrent_expiry_and_foreground_release_once() {
        let provider = Arc::new(Provider::default());
        let guard = Arc::new(BackgroundExecutionGuard::new(provider.clone()));
        let handle = guard.begin_grace(0).unwrap();

        let releases: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                thread::spawn(move || guard.end_grace(handle))
            })
            .collect();
        let released = releases
            .into_iter()
            .map(|release| release.join().unwrap())
            .filter(|released| *released)
            .count();

        assert_eq!(released, 1);
        assert_eq!(provider.ended.lock().unwrap().len(), 1);
    }
}
