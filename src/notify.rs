use std::sync::{Arc, Mutex};

/// Receives the human-readable message raised when a primary operation gives up.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Default notifier: logs the message and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!("[notice] {}", message);
    }
}

/// Keeps every message it receives. Handy for embedding apps that show
/// notices later, and for tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}
