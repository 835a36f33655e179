// file: src/models/sync.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub calendar_id: i64,
    pub events_imported: usize,
    pub events_deleted: u64,
    pub reminders_created: usize,
    /// Events dropped because they had no usable start time
    pub events_skipped: usize,
    pub import_time: DateTime<Utc>,
}

impl ImportResult {
    pub fn new(calendar_id: i64) -> Self {
        Self {
            calendar_id,
            events_imported: 0,
            events_deleted: 0,
            reminders_created: 0,
            events_skipped: 0,
            import_time: Utc::now(),
        }
    }
}
