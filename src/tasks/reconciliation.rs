//! Scheduling-gap recovery task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, Instant};
use tracing::{debug, info};

use crate::state::AppState;

/// Gaps longer than this many periods mean the process was not being scheduled
const GAP_FACTOR: u32 = 2;

/// Watch for stretches where the process was stopped (SIGSTOP, a debugger
/// breakpoint) and reconcile the coordinator when one ends.
///
/// The timers themselves are already right after a gap; this re-expires a
/// rest that ended meanwhile, re-arms a lost alert and refreshes the snapshot.
pub async fn reconciliation_task(state: Arc<AppState>, period: Duration) {
    info!("Starting reconciliation task ({}s period)", period.as_secs());

    let mut ticks = interval(period);
    ticks.tick().await;
    let mut last = Instant::now();

    loop {
        ticks.tick().await;
        let gap = last.elapsed();
        last = Instant::now();

        if gap > period * GAP_FACTOR {
            info!("Resumed after a {}s scheduling gap, reconciling timers", gap.as_secs());
            state.coordinator.reconcile();
        } else {
            debug!("No scheduling gap ({}ms)", gap.as_millis());
        }
    }
}
