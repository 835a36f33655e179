// Calendar store collaborator and the field/value records it exchanges.

use crate::error::AppResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Null,
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<Option<i64>> for FieldValue {
    fn from(value: Option<i64>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Integer)
    }
}

/// Ordered field-name/value pairs. Setting a field twice replaces its value
/// in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(&'static str, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &'static str, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &'static str, value: impl Into<FieldValue>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        match self.get(field) {
            Some(FieldValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn integer(&self, field: &str) -> Option<i64> {
        match self.get(field) {
            Some(FieldValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (*name, value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarInfo {
    pub id: i64,
    pub display_name: String,
    pub account_type: String,
}

/// One event to write and the minutes-before offsets of its reminders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventWrite {
    pub record: Record,
    pub reminder_minutes: Vec<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceCounts {
    pub deleted: u64,
    pub events: usize,
    pub reminders: usize,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalendarStore: Send + Sync {
    async fn insert_event(&self, record: Record) -> AppResult<i64>;

    /// Alert-method reminder `minutes` before the event start.
    async fn insert_reminder(&self, event_id: i64, minutes: u32) -> AppResult<i64>;

    /// Flags events of the calendar as deleted, restricted to uids ending in
    /// `uid_suffix` when one is given. Returns the number of events flagged.
    async fn soft_delete_events(&self, calendar_id: i64, uid_suffix: Option<String>)
        -> AppResult<u64>;

    /// Soft-deletes the slice `uid_suffix` selects, then inserts `events` and
    /// their reminders. Either every write lands or none does.
    async fn replace_events(
        &self,
        calendar_id: i64,
        uid_suffix: Option<String>,
        events: Vec<EventWrite>,
    ) -> AppResult<ReplaceCounts>;

    async fn soft_delete_event(&self, event_id: i64) -> AppResult<u64>;

    /// Events not flagged as deleted.
    async fn query_events(&self, calendar_id: i64, uid_suffix: Option<String>)
        -> AppResult<Vec<Record>>;

    async fn list_calendars(&self, account_type: &str) -> AppResult<Vec<CalendarInfo>>;
}
