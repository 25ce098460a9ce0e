use chrono::{DateTime, Duration, Utc};

use super::types::GovernanceState;

/// Freshness window applied when no configuration overrides it
pub const DEFAULT_STALENESS_WINDOW_MINUTES: i64 = 5;

/// True when `last_checked` is older than `window` at `now`.
///
/// Advisory only: callers downgrade a success to a warning, never to a failure.
pub fn is_stale(state: &GovernanceState, now: DateTime<Utc>, window: Duration) -> bool {
    now.signed_duration_since(state.last_checked) > window
}

#[derive(Debug, Clone, Copy)]
pub struct StalenessMonitor {
    window: Duration,
}

impl Default for StalenessMonitor {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_STALENESS_WINDOW_MINUTES))
    }
}

impl StalenessMonitor {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_stale(&self, state: &GovernanceState, now: DateTime<Utc>) -> bool {
        is_stale(state, now, self.window)
    }

    /// Human-readable indicator for status output
    pub fn describe(&self, state: &GovernanceState, now: DateTime<Utc>) -> Option<String> {
        if self.is_stale(state, now) {
            Some(format!("⚠ stale (>{}m)", self.window.num_minutes()))
        } else {
            None
        }
    }
}
