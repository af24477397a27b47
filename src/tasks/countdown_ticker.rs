//! Display tick driver

use std::{sync::Arc, time::Duration};
use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::state::{AppState, DisplayTick};

/// Push a `DisplayTick` once per second while either timer runs.
///
/// Every tick is recomputed from the coordinator's clock, so a missed or late
/// tick only delays the display; it never shifts the timers. When nothing runs
/// the task sleeps until the next published snapshot.
pub async fn countdown_ticker_task(state: Arc<AppState>) {
    info!("Starting countdown ticker");

    let mut snapshots = state.coordinator.subscribe();

    loop {
        let running = state.coordinator.is_workout_active() || state.coordinator.is_resting();

        if !running {
            publish_tick(&state);
            debug!("Nothing counting, ticker idle");
            if snapshots.changed().await.is_err() {
                break;
            }
            continue;
        }

        let mut ticks = interval(Duration::from_secs(1));
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticks.tick().await;
            let tick = publish_tick(&state);
            if !tick.resting && !state.coordinator.is_workout_active() {
                break;
            }
        }
    }

    info!("Snapshot channel closed, ticker stopping");
}

fn publish_tick(state: &AppState) -> DisplayTick {
    let coordinator = &state.coordinator;
    // Reading remaining time is what expires a finished rest if nothing else has.
    let rest_remaining_seconds = coordinator.rest_time_remaining_seconds();
    let tick = DisplayTick {
        elapsed_workout_seconds: coordinator.elapsed_workout_seconds(),
        rest_remaining_seconds,
        resting: coordinator.is_resting(),
        at: Some(Utc::now()),
    };
    state.tick_tx.send_replace(tick.clone());
    tick
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::test_support::host;

    #[tokio::test(start_paused = true)]
    async fn finished_rest_is_expired_by_the_tick_then_ticker_idles() {
        let (clock, state) = host(None);
        state.coordinator.start_rest_timer(5);
        let mut ticks = state.subscribe_ticks();
        let ticker = tokio::spawn(countdown_ticker_task(Arc::clone(&state)));

        let remaining = ticks.wait_for(|tick| tick.resting).await.unwrap().rest_remaining_seconds;
        assert_eq!(remaining, 5);

        // Only the ticker reads the coordinator from here on.
        clock.advance_secs(6);
        let resting = ticks.wait_for(|tick| !tick.resting).await.unwrap().resting;
        assert!(!resting);
        assert!(!state.coordinator.latest_snapshot().is_resting);
        assert!(state.coordinator.pending_alert().is_none());

        tokio::time::sleep(Duration::from_secs(10)).await;
        let _ = ticks.borrow_and_update();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!ticks.has_changed().unwrap());

        state.coordinator.start_rest_timer(30);
        let remaining = ticks.wait_for(|tick| tick.resting).await.unwrap().rest_remaining_seconds;
        assert_eq!(remaining, 30);
        ticker.abort();
    }
}
