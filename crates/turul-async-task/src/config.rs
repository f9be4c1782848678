//! Per-task configuration.

/// Configuration for an [`AsyncTask`](crate::AsyncTask).
#[derive(Debug, Clone)]
pub struct AsyncTaskConfig {
    /// Label attached to every log event emitted by the task
    pub label: String,
    /// Whether `finish()` may be called on a task that never began
    pub allow_finish_before_begin: bool,
}

impl Default for AsyncTaskConfig {
    fn default() -> Self {
        Self {
            label: "AsyncTask".to_string(),
            allow_finish_before_begin: true,
        }
    }
}

impl AsyncTaskConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_finish_before_begin(mut self, allow: bool) -> Self {
        self.allow_finish_before_begin = allow;
        self
    }
}
