//! User notification port.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

/// Host user identifier (username).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

/// Delivery is fire-and-forget; the host decides the channel.
pub trait Notifier: Send + Sync {
    fn trigger(&self, event: &str, recipient: &UserId, notification: &Notification);
}

/// Writes notifications to the log; used by the CLI host.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn trigger(&self, event: &str, recipient: &UserId, notification: &Notification) {
        tracing::info!(
            event,
            recipient = %recipient,
            title = %notification.title,
            "{}",
            notification.message
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub event: String,
    pub recipient: UserId,
    pub notification: Notification,
}

/// Keeps every notification in memory so tests can assert on them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn trigger(&self, event: &str, recipient: &UserId, notification: &Notification) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentNotification {
                event: event.to_string(),
                recipient: recipient.clone(),
                notification: notification.clone(),
            });
        }
    }
}
