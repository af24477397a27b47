//! HTTP endpoint handlers
//!
//! Thin adapters: each handler forwards to the coordinator and reports the
//! resulting timer readings. None of them can fail.

use std::sync::Arc;
use axum::{extract::State, response::Json};
use tracing::info;

use crate::{
    events::PlatformEvent,
    services::LiveSnapshot,
    state::AppState,
};
use super::responses::{
    AdjustRestRequest, ApiResponse, HealthResponse, MinimizedRequest, NameRequest,
    NotificationActionRequest, StartRestRequest, StatusResponse, TimersView,
};

fn timers(state: &AppState) -> TimersView {
    TimersView::from(&state.coordinator.status())
}

/// Handle POST /workout/start
pub async fn start_workout_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.record_action("workout-start");
    state.coordinator.start_workout_timer();
    Json(ApiResponse::ok("Workout timer running", timers(&state)))
}

/// Handle POST /workout/stop
pub async fn stop_workout_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.record_action("workout-stop");
    state.coordinator.stop_workout_timer();
    Json(ApiResponse::ok("Workout timer stopped", timers(&state)))
}

/// Handle POST /workout/resume
pub async fn resume_workout_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.record_action("workout-resume");
    state.coordinator.resume_workout_timer();
    Json(ApiResponse::ok("Workout timer resumed", timers(&state)))
}

/// Handle POST /workout/finish - workout completed or cancelled
pub async fn finish_workout_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.record_action("workout-finish");
    state.coordinator.cleanup();
    state.persist_or_warn().await;
    info!("Workout finished, timers cleaned up");
    Json(ApiResponse::ok("Timers cleaned up", timers(&state)))
}

/// Handle PUT /workout/name
pub async fn workout_name_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NameRequest>,
) -> Json<ApiResponse> {
    state.record_action("workout-name");
    state.coordinator.update_workout_name(request.name);
    Json(ApiResponse::ok("Workout name updated", timers(&state)))
}

/// Handle PUT /workout/exercise
pub async fn current_exercise_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NameRequest>,
) -> Json<ApiResponse> {
    state.record_action("current-exercise");
    state.coordinator.update_current_exercise(request.name);
    Json(ApiResponse::ok("Current exercise updated", timers(&state)))
}

/// Handle POST /rest/start
pub async fn start_rest_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartRestRequest>,
) -> Json<ApiResponse> {
    state.record_action("rest-start");
    state.coordinator.start_rest_timer(request.seconds);
    Json(ApiResponse::ok("Rest timer running", timers(&state)))
}

/// Handle POST /rest/adjust
pub async fn adjust_rest_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AdjustRestRequest>,
) -> Json<ApiResponse> {
    state.record_action("rest-adjust");
    state.coordinator.adjust_rest_time(request.delta);
    Json(ApiResponse::ok(format!("Rest adjusted by {}s", request.delta), timers(&state)))
}

/// Handle POST /rest/end - user skipped the rest
pub async fn end_rest_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.record_action("rest-end");
    state.coordinator.end_rest_timer();
    Json(ApiResponse::ok("Rest timer ended", timers(&state)))
}

/// Handle PUT /minimized
pub async fn minimized_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MinimizedRequest>,
) -> Json<ApiResponse> {
    state.record_action(if request.minimized { "minimize" } else { "expand" });
    state.coordinator.set_minimized(request.minimized);
    Json(ApiResponse::ok(
        if request.minimized { "Workout minimized" } else { "Workout expanded" },
        timers(&state),
    ))
}

/// Handle POST /lifecycle/background
pub async fn background_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.record_action("background");
    state.coordinator.handle_event(PlatformEvent::AppBackgrounded);
    state.persist_or_warn().await;
    Json(ApiResponse::ok("App backgrounded", timers(&state)))
}

/// Handle POST /lifecycle/foreground
pub async fn foreground_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.record_action("foreground");
    state.coordinator.handle_event(PlatformEvent::AppForegrounded);
    Json(ApiResponse::ok("App foregrounded", timers(&state)))
}

/// Handle POST /notification/action - a tapped alert action
pub async fn notification_action_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NotificationActionRequest>,
) -> Json<ApiResponse> {
    state.record_action(request.action.identifier());
    state.coordinator.handle_event(PlatformEvent::NotificationAction {
        action: request.action,
        alert: request.alert,
    });
    Json(ApiResponse::ok(format!("Handled {}", request.action), timers(&state)))
}

/// Handle GET /snapshot - what the live-status surface last received
pub async fn snapshot_handler(State(state): State<Arc<AppState>>) -> Json<LiveSnapshot> {
    Json(state.coordinator.latest_snapshot())
}

/// Handle GET /status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();
    Json(StatusResponse {
        coordinator: state.coordinator.status(),
        last_tick: state.latest_tick(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
