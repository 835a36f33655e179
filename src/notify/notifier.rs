// Notification sink collaborator.

use crate::error::AppResult;
use crate::models::NotificationTarget;
use log::info;
use std::time::{SystemTime, UNIX_EPOCH};

/// Platform icon resource references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconRefs {
    pub small: i64,
    pub large: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub text: String,
    pub target: NotificationTarget,
    pub icons: IconRefs,
    /// Channel the notification is posted to
    pub category: String,
    pub id: i32,
}

#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification) -> AppResult<()>;
}

/// Derived from the clock so that successive notifications do not replace
/// each other.
pub fn notification_id() -> i32 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    (nanos % i32::MAX as u128) as i32
}

/// Writes notifications to the log instead of a platform tray.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) -> AppResult<()> {
        info!(
            "[Notify] #{} [{}] {}: {} -> {:?}",
            notification.id,
            notification.category,
            notification.title,
            notification.text,
            notification.target
        );
        Ok(())
    }
}
