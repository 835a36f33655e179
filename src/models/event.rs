// file: src/models/event.rs
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    // The calendar store only understands "N minutes before start".
    static ref MINUTES_BEFORE_TRIGGER: Regex = Regex::new(r"^-PT(\d+)M$").unwrap();
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub uid: String,
    pub title: String,
    pub description: String,
    /// Epoch milliseconds, absent when DTSTART was missing or unparseable
    pub start_timestamp: Option<i64>,
    pub end_timestamp: Option<i64>,
    pub location: String,
    /// Raw RDATE value
    pub recurrence: String,
    pub reminders: Vec<CalendarReminder>,
}

impl CalendarEvent {
    pub fn has_uid_suffix(&self, suffix: &str) -> bool {
        self.uid.ends_with(suffix)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarReminder {
    pub description: String,
    /// Raw TRIGGER value, e.g. `-PT15M`
    pub trigger: String,
}

impl CalendarReminder {
    /// Minutes before the event start, only for triggers of the form `-PT<N>M`.
    pub fn offset_minutes(&self) -> Option<u32> {
        MINUTES_BEFORE_TRIGGER
            .captures(&self.trigger)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}
