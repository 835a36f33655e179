// Replaces the imported slice of a calendar with the events of an iCalendar
// document.

use crate::calendar::date::ZoneAnchor;
use crate::calendar::fields;
use crate::calendar::parser::parse_calendar_events;
use crate::calendar::store::{CalendarStore, EventWrite, Record};
use crate::config::BridgeConfig;
use crate::error::{AppError, AppResult};
use crate::models::{CalendarEvent, ImportResult};
use crate::utils::logging;
use chrono_tz::Tz;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// IANA zone stored with every inserted event
    pub event_timezone: String,
    pub anchor: ZoneAnchor,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            event_timezone: crate::config::DEFAULT_EVENT_TIMEZONE.to_string(),
            anchor: ZoneAnchor::System,
        }
    }
}

impl ImportOptions {
    pub fn from_config(config: &BridgeConfig) -> AppResult<Self> {
        config.event_timezone.parse::<Tz>().map_err(|e| {
            AppError::config(format!(
                "Unknown event time zone '{}': {}",
                config.event_timezone, e
            ))
        })?;

        Ok(Self {
            event_timezone: config.event_timezone.clone(),
            anchor: ZoneAnchor::from_config(config.date_anchor_zone.as_deref())?,
        })
    }
}

/// `None` for events the store cannot hold because they have no start.
pub fn event_record(calendar_id: i64, event: &CalendarEvent, event_timezone: &str) -> Option<Record> {
    let start = event.start_timestamp?;
    Some(
        Record::new()
            .with(fields::CALENDAR_ID, calendar_id)
            .with(fields::UID, event.uid.as_str())
            .with(fields::TITLE, event.title.as_str())
            .with(fields::DESCRIPTION, event.description.as_str())
            .with(fields::DTSTART, start)
            .with(fields::DTEND, event.end_timestamp)
            .with(fields::EVENT_LOCATION, event.location.as_str())
            .with(fields::EVENT_TIMEZONE, event_timezone)
            .with(fields::RDATE, event.recurrence.as_str()),
    )
}

/// Replaces the calendar's events whose uid ends with `uid_suffix` (all of
/// them without a suffix) with every parsed event and its minutes-before
/// reminders, in a single store call. Uids are stored as they appear in the
/// document.
pub async fn import_calendar(
    store: &dyn CalendarStore,
    calendar_id: i64,
    ical_data: &str,
    uid_suffix: Option<&str>,
    options: &ImportOptions,
) -> AppResult<ImportResult> {
    let started = Instant::now();
    let mut result = ImportResult::new(calendar_id);
    let mut writes = Vec::new();

    for event in parse_calendar_events(ical_data, options.anchor) {
        let Some(record) = event_record(calendar_id, &event, &options.event_timezone) else {
            log::debug!("[Calendar] Skipping event '{}' without a start time", event.uid);
            result.events_skipped += 1;
            continue;
        };

        if let Some(suffix) = uid_suffix {
            if !event.has_uid_suffix(suffix) {
                log::warn!(
                    "[Calendar] Event '{}' does not end with '{}' and will survive the next import",
                    event.uid,
                    suffix
                );
            }
        }

        writes.push(EventWrite {
            record,
            reminder_minutes: reminder_minutes(&event),
        });
    }

    let counts = store
        .replace_events(calendar_id, uid_suffix.map(str::to_string), writes)
        .await?;
    result.events_deleted = counts.deleted;
    result.events_imported = counts.events;
    result.reminders_created = counts.reminders;

    logging::log_calendar_import(
        calendar_id,
        result.events_imported,
        result.events_deleted,
        started.elapsed().as_millis() as u64,
    );
    Ok(result)
}

fn reminder_minutes(event: &CalendarEvent) -> Vec<u32> {
    event
        .reminders
        .iter()
        .filter_map(|reminder| {
            let minutes = reminder.offset_minutes();
            if minutes.is_none() {
                log::debug!(
                    "[Calendar] Ignoring trigger '{}' on event '{}'",
                    reminder.trigger,
                    event.uid
                );
            }
            minutes
        })
        .collect()
}
