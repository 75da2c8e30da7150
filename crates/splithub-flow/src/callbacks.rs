use std::fmt;

type Callback = Box<dyn Fn(&str) + Send + Sync>;

/// Hooks invoked when a flow finishes.
///
/// `on_success` receives the relay's transaction hash, `on_error` the
/// user-facing error message.
#[derive(Default)]
pub struct FlowCallbacks {
    on_success: Option<Callback>,
    on_error: Option<Callback>,
}

impl FlowCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(f));
        self
    }

    pub(crate) fn success(&self, tx_hash: &str) {
        if let Some(f) = &self.on_success {
            f(tx_hash);
        }
    }

    pub(crate) fn error(&self, message: &str) {
        if let Some(f) = &self.on_error {
            f(message);
        }
    }
}

impl fmt::Debug for FlowCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowCallbacks")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
