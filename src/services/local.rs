//! Desktop-Linux implementations of the platform ports
//!
//! Used by the host binary. Each operation spawns a tokio task and reports
//! back through the `PlatformEvent` channel, so nothing here blocks the caller.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::Duration,
};
use tokio::{
    process::Command,
    runtime::Handle,
    sync::mpsc,
    task::JoinHandle,
    time::sleep,
};
use tracing::{debug, info, warn};

use crate::{
    error::PlatformError,
    events::{AlertAction, AlertId, GraceHandle, PlatformEvent},
    services::{AlertRequest, AlertScheduler, GraceProvider, LiveSnapshot, LiveStatusSurface},
    utils::lock,
};

pub type EventSender = mpsc::UnboundedSender<PlatformEvent>;

fn current_runtime() -> Result<Handle, PlatformError> {
    Handle::try_current().map_err(|e| PlatformError::Unavailable(format!("no async runtime: {}", e)))
}

/// Check if notify-send is available for desktop alerts
pub async fn check_notify_send_available() -> bool {
    match Command::new("notify-send").arg("--version").output().await {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

/// notify-send arguments for an alert, one `--action` per alert button
fn notification_args(title: &str, body: &str, actions: &[AlertAction]) -> Vec<String> {
    let mut args = vec!["--app-name=workout-timer".to_string(), "--urgency=critical".to_string()];
    args.extend(
        actions
            .iter()
            .map(|action| format!("--action={}={}", action.identifier(), action.label())),
    );
    args.push(title.to_string());
    args.push(body.to_string());
    args
}

/// notify-send prints the key of the clicked button, or nothing when dismissed
fn chosen_action(stdout: &str) -> Option<AlertAction> {
    stdout.trim().parse().ok()
}

/// Raise a desktop notification through notify-send and wait for a button press
async fn send_desktop_notification(
    title: &str,
    body: &str,
    actions: &[AlertAction],
) -> Result<Option<AlertAction>, String> {
    let output = Command::new("notify-send")
        .args(notification_args(title, body, actions))
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| format!("Failed to execute notify-send: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("notify-send failed: {}", stderr));
    }
    Ok(chosen_action(&String::from_utf8_lossy(&output.stdout)))
}

/// Alert scheduler backed by tokio timers, optionally raising a desktop notification
/// whose buttons come back as `PlatformEvent::NotificationAction`
pub struct TokioAlertScheduler {
    events: EventSender,
    desktop: bool,
    pending: Mutex<HashMap<AlertId, JoinHandle<()>>>,
}

impl TokioAlertScheduler {
    pub fn new(events: EventSender, desktop: bool) -> Self {
        Self {
            events,
            desktop,
            pending: Mutex::new(HashMap::new()),
        }
    }
}

impl AlertScheduler for TokioAlertScheduler {
    fn schedule(&self, request: &AlertRequest) -> Result<(), PlatformError> {
        let id = request.id;
        let delay = request.fire_in;
        let title = request.title.clone();
        let body = request.body.clone();
        let actions = request.actions;
        let events = self.events.clone();
        let desktop = self.desktop;
        let runtime = current_runtime()?;

        let task = runtime.spawn(async move {
            sleep(delay).await;
            info!("Alert {} fired: {}", id, body);
            if events.send(PlatformEvent::AlertDelivered(id)).is_err() {
                debug!("Event channel closed, dropping delivery of {}", id);
            }
            if !desktop {
                return;
            }
            match send_desktop_notification(&title, &body, &actions).await {
                Ok(Some(action)) => {
                    info!("Alert {} answered with {}", id, action);
                    let event = PlatformEvent::NotificationAction { action, alert: Some(id) };
                    if events.send(event).is_err() {
                        debug!("Event channel closed, dropping {} from {}", action, id);
                    }
                }
                Ok(None) => debug!("Alert {} dismissed", id),
                Err(e) => warn!("{}", e),
            }
        });

        let mut pending = lock(&self.pending);
        pending.retain(|_, task| !task.is_finished());
        pending.insert(id, task);
        Ok(())
    }

    fn cancel(&self, id: AlertId) {
        if let Some(task) = lock(&self.pending).remove(&id) {
            task.abort();
        }
    }
}

/// Grace provider that expires grants after a fixed ceiling, optionally holding
/// a systemd sleep inhibitor for the duration of the grant
pub struct TokioGraceProvider {
    events: EventSender,
    ceiling: Duration,
    inhibit_sleep: bool,
    grants: Mutex<HashMap<u64, JoinHandle<()>>>,
}

impl TokioGraceProvider {
    pub fn new(events: EventSender, ceiling: Duration, inhibit_sleep: bool) -> Self {
        Self {
            events,
            ceiling,
            inhibit_sleep,
            grants: Mutex::new(HashMap::new()),
        }
    }
}

impl GraceProvider for TokioGraceProvider {
    fn begin(&self, handle: GraceHandle) -> Result<(), PlatformError> {
        let events = self.events.clone();
        let ceiling = self.ceiling;
        let runtime = current_runtime()?;

        // Spawned before the task so a missing systemd-inhibit surfaces as a refusal.
        let inhibitor = if self.inhibit_sleep {
            let secs = ceiling.as_secs().max(1).to_string();
            let child = Command::new("systemd-inhibit")
                .args([
                    "--what=sleep",
                    "--who=workout-timer",
                    "--why=Finishing timer bookkeeping",
                    "sleep",
                    secs.as_str(),
                ])
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| PlatformError::PermissionDenied(format!("systemd-inhibit: {}", e)))?;
            Some(child)
        } else {
            None
        };

        let task = runtime.spawn(async move {
            let _inhibitor = inhibitor;
            sleep(ceiling).await;
            debug!("Grace grant {} reached its {}s ceiling", handle.id, ceiling.as_secs());
            if events.send(PlatformEvent::GraceExpired(handle)).is_err() {
                debug!("Event channel closed, dropping expiry of grant {}", handle.id);
            }
        });

        lock(&self.grants).insert(handle.id, task);
        Ok(())
    }

    fn end(&self, handle: GraceHandle) {
        // Aborting drops the inhibitor child, which kills it.
        if let Some(task) = lock(&self.grants).remove(&handle.id) {
            task.abort();
        }
    }
}

/// Surface that writes each snapshot to the log as JSON.
///
/// The in-process watch channel on the publisher is what local views read;
/// this stands in for the OS widget.
#[derive(Debug, Default)]
pub struct LogSurface;

impl LiveStatusSurface for LogSurface {
    fn update(&self, snapshot: &LiveSnapshot) -> Result<(), PlatformError> {
        let json = serde_json::to_string(snapshot)
            .map_err(|e| PlatformError::Unavailable(format!("snapshot encoding: {}", e)))?;
        info!("Live status: {}", json);
        Ok(())
    }

    fn end(&self) -> Result<(), PlatformError> {
        info!("Live status dismissed");
        Ok(())
    }
}
