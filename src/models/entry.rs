// file: src/models/entry.rs
use serde::{Deserialize, Serialize};

/// Unit of the pull-notification snapshot. Two entries are the same entry
/// when all three fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationEntry {
    pub title: String,
    pub text: String,
    /// Tap target: `http(s)://...` or `intent:<component>[,<url>]`
    pub data: String,
}

impl NotificationEntry {
    pub fn new(title: impl Into<String>, text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            data: data.into(),
        }
    }
}

/// Where tapping a notification leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationTarget {
    Url(String),
    Component { class_name: String, url: Option<String> },
}

impl NotificationTarget {
    /// `None` for data that selects neither a URL nor a component.
    pub fn from_entry_data(data: &str) -> Option<Self> {
        if data.starts_with("http:") || data.starts_with("https:") {
            return Some(NotificationTarget::Url(data.to_string()));
        }

        let intent = data.strip_prefix("intent:")?;
        let (class_name, url) = match intent.split_once(',') {
            Some((class_name, url)) => (class_name, Some(url.to_string())),
            None => (intent, None),
        };
        Some(NotificationTarget::Component {
            class_name: class_name.to_string(),
            url,
        })
    }
}
