use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Danger,
}

/// A one-shot toast shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: Option<String>,
    pub message: String,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            title: None,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Danger, message)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let title = notification.title.as_deref().unwrap_or_default();
        match notification.level {
            NotificationLevel::Danger => warn!(title, message = %notification.message, "notification"),
            _ => info!(level = ?notification.level, title, message = %notification.message, "notification"),
        }
    }
}

/// Forwards notifications to a renderer task.
impl Notifier for mpsc::UnboundedSender<Notification> {
    fn notify(&self, notification: Notification) {
        let _ = self.send(notification);
    }
}

/// Keeps every notification in memory.
#[derive(Default)]
pub struct RecordingNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

#[cfg(test)]
#[path = "tests/notifier_tests.rs"]
mod tests;
