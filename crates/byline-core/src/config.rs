//! Autosave timing configuration

use std::time::Duration;

/// Default debounce before an edit is written to the local snapshot store.
const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(1);

/// Default interval between remote sync ticks.
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(30);

/// Default number of consecutive transient failures before the session
/// escalates to a user-visible state.
const DEFAULT_ESCALATION_THRESHOLD: u32 = 5;

/// Timing and retry configuration for an autosave session
#[derive(Debug, Clone)]
pub struct AutosaveConfig {
    /// Quiet period after an edit before the local snapshot is written
    pub debounce: Duration,
    /// Fixed interval between remote sync ticks
    pub tick_interval: Duration,
    /// Consecutive transient failures tolerated before escalation
    pub failure_escalation_threshold: u32,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            tick_interval: DEFAULT_TICK_INTERVAL,
            failure_escalation_threshold: DEFAULT_ESCALATION_THRESHOLD,
        }
    }
}

impl AutosaveConfig {
    /// Set the local write debounce
    #[must_use]
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the remote tick interval
    #[must_use]
    pub const fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the consecutive-failure escalation threshold
    #[must_use]
    pub const fn with_failure_escalation_threshold(mut self, threshold: u32) -> Self {
        self.failure_escalation_threshold = threshold;
        self
    }
}
