mod common;

use std::sync::Arc;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;

use common::Harness;
use workout_timer::{
    api::create_router,
    state::{AppState, MAX_REST_SECONDS},
};

fn app(h: &Harness) -> (Router, Arc<AppState>) {
    let (events_tx, _events_rx) = mpsc::unbounded_channel();
    let state = Arc::new(AppState::new(
        Arc::clone(&h.coordinator),
        events_tx,
        None,
        20554,
        "127.0.0.1".to_string(),
    ));
    (create_router(Arc::clone(&state)), state)
}

async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };
    let response = router.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

#[tokio::test]
async fn health_reports_ok() {
    let h = Harness::new();
    let (router, _) = app(&h);
    let (status, body) = call(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn rest_start_and_skip_action_round_trip() {
    let h = Harness::new();
    let (router, _) = app(&h);

    let (status, body) = call(&router, Method::POST, "/rest/start", Some(json!({ "seconds": 90 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timers"]["resting"], true);
    assert_eq!(body["timers"]["rest_remaining_seconds"], 90);

    let alert = h.only_alert();
    let (_, body) = call(
        &router,
        Method::POST,
        "/notification/action",
        Some(json!({ "action": "SKIP_ACTION", "alert": alert.id })),
    )
    .await;
    assert_eq!(body["timers"]["resting"], false);
    assert_eq!(body["timers"]["rest_remaining_seconds"], 0);
}

#[tokio::test]
async fn negative_rest_is_clamped() {
    let h = Harness::new();
    let (router, _) = app(&h);
    let (_, body) = call(&router, Method::POST, "/rest/start", Some(json!({ "seconds": -5 }))).await;
    assert_eq!(body["timers"]["rest_remaining_seconds"], 1);
}

#[tokio::test]
async fn extreme_adjust_is_capped() {
    let h = Harness::new();
    let (router, _) = app(&h);
    call(&router, Method::POST, "/rest/start", Some(json!({ "seconds": 60 }))).await;
    let (status, body) = call(&router, Method::POST, "/rest/adjust", Some(json!({ "delta": i64::MAX }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timers"]["rest_remaining_seconds"], MAX_REST_SECONDS);

    let (status, body) = call(&router, Method::GET, "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["coordinator"]["rest_duration_seconds"], MAX_REST_SECONDS);
}

#[tokio::test]
async fn unknown_action_is_rejected() {
    let h = Harness::new();
    let (router, _) = app(&h);
    let (status, _) = call(
        &router,
        Method::POST,
        "/notification/action",
        Some(json!({ "action": "SNOOZE_ACTION" })),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn snapshot_reflects_metadata() {
    let h = Harness::new();
    let (router, _) = app(&h);

    call(&router, Method::PUT, "/workout/name", Some(json!({ "name": "Push" }))).await;
    call(&router, Method::PUT, "/workout/exercise", Some(json!({ "name": "Bench Press" }))).await;
    let (_, snapshot) = call(&router, Method::GET, "/snapshot", None).await;

    assert_eq!(snapshot["workoutName"], "Push");
    assert_eq!(snapshot["currentExercise"], "Bench Press");
    assert_eq!(snapshot["isResting"], false);
}

#[tokio::test]
async fn lifecycle_and_finish_show_in_status() {
    let h = Harness::new();
    let (router, state) = app(&h);

    call(&router, Method::POST, "/workout/start", None).await;
    call(&router, Method::PUT, "/minimized", Some(json!({ "minimized": true }))).await;
    call(&router, Method::POST, "/lifecycle/background", None).await;
    h.clock.advance_secs(600);

    let (_, status) = call(&router, Method::GET, "/status", None).await;
    assert_eq!(status["coordinator"]["elapsed_workout_seconds"], 600);
    assert_eq!(status["coordinator"]["minimized"], true);
    assert!(status["coordinator"]["grace"].is_object());
    assert_eq!(status["last_action"], "background");

    call(&router, Method::POST, "/lifecycle/foreground", None).await;
    call(&router, Method::POST, "/workout/finish", None).await;

    let coordinator = state.coordinator.status();
    assert!(!coordinator.workout_active);
    assert!(!coordinator.minimized);
    assert!(coordinator.grace.is_none());
    assert_eq!(h.surface.ended(), 1);
}
