// Declare modules
pub mod entry;
pub mod event;
pub mod request;
pub mod sync;

// Flattened so callers can `use crate::models::CalendarEvent`.
pub use entry::{NotificationEntry, NotificationTarget};
pub use event::{CalendarEvent, CalendarReminder};
pub use request::{HttpMethod, InterceptedRequest, ProxiedResponse, RouteOutcome};
pub use sync::ImportResult;
