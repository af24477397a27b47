//! Timer state as written to disk while the app is backgrounded
//!
//! Instants are stored on the wall clock: the monotonic origin of a new
//! process has no relation to the old one.

use std::path::Path;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedTimers {
    pub epoch: u64,
    pub rest_generation: u64,
    pub workout_active: bool,
    pub workout_started_at: Option<DateTime<Utc>>,
    pub workout_banked_seconds: u64,
    pub rest_started_at: Option<DateTime<Utc>>,
    pub rest_duration_seconds: Option<u64>,
    pub workout_name: String,
    pub current_exercise: String,
    pub saved_at: Option<DateTime<Utc>>,
}

impl PersistedTimers {
    /// Load from a JSON file. A missing file yields `None`.
    pub async fn load(path: &Path) -> anyhow::Result<Option<Self>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let timers = serde_json::from_slice(&bytes)
                    .with_context(|| format!("Failed to parse timer state in {}", path.display()))?;
                Ok(Some(timers))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    /// Write as JSON through a temporary file, so a crash mid-write keeps the old state
    pub async fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("Failed to move timer state into {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_load_from_disk() {
        let dir = std::env::temp_dir().join(format!("workout-timer-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("timers.json");

        let timers = PersistedTimers {
            epoch: 3,
            rest_generation: 9,
            workout_active: true,
            workout_started_at: Some(Utc::now()),
            workout_name: "Leg Day".into(),
            ..PersistedTimers::default()
        };
        timers.save(&path).await.unwrap();

        assert_eq!(PersistedTimers::load(&path).await.unwrap(), Some(timers));
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_not_an_error() {
        let path = std::env::temp_dir().join("workout-timer-does-not-exist.json");
        assert_eq!(PersistedTimers::load(&path).await.unwrap(), None);
    }
}
