//! Workout Timer - host binary
//!
//! Composition root: builds the coordinator with the local platform, restores
//! saved timers, and runs the control server with its background tasks.

use std::sync::Arc;
use tokio::{net::TcpListener, sync::mpsc};
use tracing::{info, warn};

use workout_timer::{
    api::create_router,
    clock::SystemClock,
    config::Config,
    services::local::{check_notify_send_available, LogSurface, TokioAlertScheduler, TokioGraceProvider},
    state::{AppState, PersistedTimers, Platform, TimerCoordinator},
    tasks::{countdown_ticker_task, event_router_task, reconciliation_task},
    utils::{lifecycle_signals, shutdown_signal},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("workout_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting workout-timer v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, add_time={}s, grace={}s",
        config.host, config.port, config.add_time, config.grace
    );

    let desktop_alerts = config.desktop_alerts && check_notify_send_available().await;
    if config.desktop_alerts && !desktop_alerts {
        warn!("notify-send is not available, rest alerts will only be logged");
    }

    // Platform callbacks flow back through this channel
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let platform = Platform {
        alerts: Arc::new(TokioAlertScheduler::new(events_tx.clone(), desktop_alerts)),
        grace: Arc::new(TokioGraceProvider::new(
            events_tx.clone(),
            config.grace_ceiling(),
            config.inhibit_sleep,
        )),
        surface: Arc::new(LogSurface),
    };
    let coordinator = Arc::new(TimerCoordinator::new(
        Arc::new(SystemClock::new()),
        platform,
        config.coordinator_settings(),
    ));

    // Reattach before any event is routed, so cold-start alert actions find their timer
    if let Some(path) = &config.state_file {
        match PersistedTimers::load(path).await {
            Ok(Some(saved)) => {
                info!("Restoring timers from {}", path.display());
                coordinator.restore(saved);
            }
            Ok(None) => info!("No saved timers at {}", path.display()),
            Err(e) => warn!("Ignoring saved timers: {:#}", e),
        }
    }

    let state = Arc::new(AppState::new(
        Arc::clone(&coordinator),
        events_tx,
        config.state_file.clone(),
        config.port,
        config.host.clone(),
    ));

    tokio::spawn(event_router_task(Arc::clone(&state), events_rx));
    tokio::spawn(countdown_ticker_task(Arc::clone(&state)));
    tokio::spawn(reconciliation_task(Arc::clone(&state), config.reconcile_period()));
    tokio::spawn(lifecycle_signals(Arc::clone(&state)));

    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /workout/start|stop|resume|finish");
    info!("  PUT  /workout/name, /workout/exercise, /minimized");
    info!("  POST /rest/start, /rest/adjust, /rest/end");
    info!("  POST /lifecycle/background, /lifecycle/foreground");
    info!("  POST /notification/action");
    info!("  GET  /status, /snapshot, /health");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.persist_or_warn().await;
    info!("Server shutdown complete");
    Ok(())
}
