//! Signal handling: shutdown, and job control mapped to app lifecycle

use std::sync::Arc;
use futures::stream::StreamExt;
use signal_hook::consts::{SIGCONT, SIGINT, SIGTERM, SIGTSTP};
use signal_hook_tokio::Signals;
use tracing::{info, warn};

use crate::{events::PlatformEvent, state::AppState};

/// Wait for shutdown signals (SIGTERM, SIGINT)
pub async fn shutdown_signal() {
    let mut signals = match Signals::new([SIGTERM, SIGINT]) {
        Ok(signals) => signals,
        Err(e) => {
            warn!("Failed to register shutdown signals: {}", e);
            return std::future::pending().await;
        }
    };

    if let Some(signal) = signals.next().await {
        info!("Received signal: {}", signal);
    }
}

/// Treat terminal job control as the app lifecycle.
///
/// Ctrl-Z (SIGTSTP) backgrounds the app: the coordinator is told directly,
/// state is saved, then the process stops for real. `fg` (SIGCONT) foregrounds it.
pub async fn lifecycle_signals(state: Arc<AppState>) {
    let mut signals = match Signals::new([SIGTSTP, SIGCONT]) {
        Ok(signals) => signals,
        Err(e) => {
            warn!("Failed to register job-control signals: {}", e);
            return;
        }
    };

    while let Some(signal) = signals.next().await {
        match signal {
            SIGTSTP => {
                info!("Suspend requested, backgrounding");
                // Handled inline: once stopped, the router would not run until SIGCONT.
                state.coordinator.handle_event(PlatformEvent::AppBackgrounded);
                state.persist_or_warn().await;
                if let Err(e) = signal_hook::low_level::emulate_default_handler(SIGTSTP) {
                    warn!("Failed to stop process: {}", e);
                }
            }
            SIGCONT => {
                info!("Continued, foregrounding");
                if let Err(e) = state.send_event(PlatformEvent::AppForegrounded) {
                    warn!("{}", e);
                }
            }
            _ => {}
        }
    }
}
