// Column names shared by the calendar store and the records it exchanges.

pub const EVENT_ID: &str = "event_id";
pub const CALENDAR_ID: &str = "calendar_id";
pub const UID: &str = "uid_2445";
pub const TITLE: &str = "title";
pub const DESCRIPTION: &str = "description";
pub const DTSTART: &str = "dtstart";
pub const DTEND: &str = "dtend";
pub const EVENT_LOCATION: &str = "event_location";
pub const EVENT_TIMEZONE: &str = "event_timezone";
pub const RDATE: &str = "rdate";
pub const DELETED: &str = "deleted";

pub const MINUTES: &str = "minutes";
pub const METHOD: &str = "method";

/// Reminder method for an on-screen alert.
pub const METHOD_ALERT: i64 = 1;

/// Columns a caller may write when inserting an event.
pub const WRITABLE_EVENT_FIELDS: [&str; 9] = [
    CALENDAR_ID,
    UID,
    TITLE,
    DESCRIPTION,
    DTSTART,
    DTEND,
    EVENT_LOCATION,
    EVENT_TIMEZONE,
    RDATE,
];

pub fn is_writable_event_field(name: &str) -> bool {
    WRITABLE_EVENT_FIELDS.contains(&name)
}
