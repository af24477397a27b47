//! Best-effort record of platform failures, for visibility only

use serde::{Deserialize, Serialize};

/// Oldest entries are dropped beyond this many
const MAX_ENTRIES: usize = 32;

/// Recent platform failures, each formatted as `component: message`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub errors: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a failure for a component
    pub fn record(&mut self, component: &str, error: impl std::fmt::Display) {
        self.errors.push(format!("{}: {}", component, error));
        if self.errors.len() > MAX_ENTRIES {
            let excess = self.errors.len() - MAX_ENTRIES;
            self.errors.drain(..excess);
        }
    }

    /// Clear errors for a specific component once it works again
    pub fn clear_for(&mut self, component: &str) {
        let initial_count = self.errors.len();
        let prefix = format!("{}:", component);
        self.errors.retain(|error| !error.starts_with(&prefix));

        if self.errors.len() != initial_count {
            tracing::debug!("Cleared {} errors for component: {}", initial_count - self.errors.len(), component);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_for_only_drops_matching_component() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record("notifier", "permission denied");
        diagnostics.record("live-status", "busy");
        diagnostics.clear_for("notifier");
        assert_eq!(diagnostics.errors, vec!["live-status: busy".to_string()]);
    }

    #[test]
    fn record_is_bounded() {
        let mut diagnostics = Diagnostics::new();
        for i in 0..(MAX_ENTRIES + 5) {
            diagnostics.record("grace", i);
        }
        assert_eq!(diagnostics.errors.len(), MAX_ENTRIES);
        assert_eq!(diagnostics.errors[0], "grace: 5");
    }
}
