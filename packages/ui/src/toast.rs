use std::sync::{Arc, Mutex};

use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub timestamp: String,
    pub level: ToastLevel,
    pub message: String,
}

/// Transient, non-blocking notifications shown to the user.
///
/// Clones share one queue. The renderer drains it; every toast is also
/// emitted as a tracing event.
#[derive(Clone, Debug, Default)]
pub struct Toasts {
    entries: Arc<Mutex<Vec<Toast>>>,
}

impl Toasts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, message: impl Into<String>) {
        let message = message.into();
        info!(toast = %message);
        self.push(ToastLevel::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(toast = %message);
        self.push(ToastLevel::Error, message);
    }

    /// Everything not yet drained, oldest first.
    pub fn entries(&self) -> Vec<Toast> {
        self.entries.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|toast| toast.message.clone())
            .collect()
    }

    pub fn drain(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.entries.lock().unwrap())
    }

    fn push(&self, level: ToastLevel, message: String) {
        self.entries.lock().unwrap().push(Toast {
            timestamp: current_time(),
            level,
            message,
        });
    }
}

fn current_time() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
