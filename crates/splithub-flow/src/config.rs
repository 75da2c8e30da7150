use std::time::Duration;

/// Default lifetime of a signed authorization.
pub const DEFAULT_DEADLINE_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Default pause in `confirming` before a flow reports `success`.
pub const DEFAULT_CONFIRMATION_DELAY: Duration = Duration::from_millis(1500);

/// Tunables shared by the payment flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowConfig {
    /// How far in the future a new authorization's `deadline` is set.
    /// The contract enforces it; the client never times out on its own.
    pub deadline_window: Duration,
    /// Time spent in `confirming` after the relay returned a transaction hash.
    pub confirmation_delay: Duration,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            deadline_window: DEFAULT_DEADLINE_WINDOW,
            confirmation_delay: DEFAULT_CONFIRMATION_DELAY,
        }
    }
}

impl FlowConfig {
    pub fn with_deadline_window(mut self, window: Duration) -> Self {
        self.deadline_window = window;
        self
    }

    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay = delay;
        self
    }
}
