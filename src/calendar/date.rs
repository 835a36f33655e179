// iCalendar date text <-> epoch milliseconds.
//
// Feeds write local wall-clock digits followed by a literal `Z`. The digits are
// anchored to a zone (the system zone unless one is configured) rather than
// read as UTC.

use crate::error::{AppError, AppResult};
use chrono::{DateTime, Duration, Local, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

pub const ICAL_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoneAnchor {
    #[default]
    System,
    Named(Tz),
}

impl ZoneAnchor {
    pub fn from_config(zone: Option<&str>) -> AppResult<Self> {
        match zone {
            None => Ok(ZoneAnchor::System),
            Some(name) => name
                .parse::<Tz>()
                .map(ZoneAnchor::Named)
                .map_err(|e| AppError::config(format!("Unknown time zone '{}': {}", name, e))),
        }
    }

    fn to_epoch_millis(self, naive: &NaiveDateTime) -> Option<i64> {
        match self {
            ZoneAnchor::System => resolve_local(&Local, naive).map(|dt| dt.timestamp_millis()),
            ZoneAnchor::Named(tz) => resolve_local(&tz, naive).map(|dt| dt.timestamp_millis()),
        }
    }
}

/// Ambiguous times take the earlier offset. Times inside a DST gap move
/// forward by the usual one hour gap.
fn resolve_local<Z: TimeZone>(zone: &Z, naive: &NaiveDateTime) -> Option<DateTime<Z>> {
    match zone.from_local_datetime(naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => zone
            .from_local_datetime(&(*naive + Duration::hours(1)))
            .earliest(),
    }
}

/// `None` when the text is not in `yyyyMMddTHHmmssZ` form.
pub fn parse_ical_date(text: &str, anchor: ZoneAnchor) -> Option<i64> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), ICAL_DATE_FORMAT).ok()?;
    anchor.to_epoch_millis(&naive)
}

/// Epoch milliseconds to UTC `yyyyMMddTHHmmssZ`, sub-second precision dropped.
pub fn to_ical_date(epoch_millis: i64) -> Option<String> {
    Utc.timestamp_millis_opt(epoch_millis)
        .single()
        .map(|dt| dt.format(ICAL_DATE_FORMAT).to_string())
}
