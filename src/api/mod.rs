//! HTTP API module
//!
//! Local control surface for the host: stands in for the UI layer and for the
//! OS callbacks, forwarding both into the coordinator.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/workout/start", post(start_workout_handler))
        .route("/workout/stop", post(stop_workout_handler))
        .route("/workout/resume", post(resume_workout_handler))
        .route("/workout/finish", post(finish_workout_handler))
        .route("/workout/name", put(workout_name_handler))
        .route("/workout/exercise", put(current_exercise_handler))
        .route("/rest/start", post(start_rest_handler))
        .route("/rest/adjust", post(adjust_rest_handler))
        .route("/rest/end", post(end_rest_handler))
        .route("/minimized", put(minimized_handler))
        .route("/lifecycle/background", post(background_handler))
        .route("/lifecycle/foreground", post(foreground_handler))
        .route("/notification/action", post(notification_action_handler))
        .route("/snapshot", get(snapshot_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
