// Calendar import: iCalendar text in, store records out.

pub mod date;
pub mod fields;
pub mod parser;
pub mod store;
pub mod sync;

pub use date::{parse_ical_date, to_ical_date, ZoneAnchor};
pub use parser::{parse_calendar_events, ParseState};
pub use store::{CalendarInfo, CalendarStore, EventWrite, FieldValue, Record, ReplaceCounts};
pub use sync::{event_record, import_calendar, ImportOptions};
