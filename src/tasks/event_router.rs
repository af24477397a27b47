//! Platform event router task

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{events::PlatformEvent, state::AppState};

/// Drain platform callbacks into the coordinator, one at a time.
///
/// Timer state is saved after lifecycle transitions so a process evicted
/// while backgrounded can pick up where it left off.
pub async fn event_router_task(state: Arc<AppState>, mut events_rx: mpsc::UnboundedReceiver<PlatformEvent>) {
    info!("Starting platform event router");

    while let Some(event) = events_rx.recv().await {
        debug!("Routing platform event: {:?}", event);
        let persist = matches!(event, PlatformEvent::AppBackgrounded | PlatformEvent::AppForegrounded);

        state.coordinator.handle_event(event);

        if persist {
            state.persist_or_warn().await;
        }
    }

    info!("Platform event channel closed, router stopping");
}
