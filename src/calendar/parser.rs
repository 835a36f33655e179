// Line-oriented iCalendar scanner.
//
// Only VEVENT blocks and their VALARM children are read. Lines are trimmed
// but not unfolded, and a field value is everything after the first colon,
// so values containing parameters with colons come out truncated.

use crate::calendar::date::{parse_ical_date, ZoneAnchor};
use crate::models::{CalendarEvent, CalendarReminder};
use log::debug;

const BEGIN_EVENT: &str = "BEGIN:VEVENT";
const END_EVENT: &str = "END:VEVENT";
const BEGIN_ALARM: &str = "BEGIN:VALARM";
const END_ALARM: &str = "END:VALARM";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventField {
    Uid,
    Summary,
    Description,
    Start,
    End,
    Location,
    Recurrence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AlarmField {
    Description,
    Trigger,
}

const EVENT_FIELDS: [(&str, EventField); 7] = [
    ("UID:", EventField::Uid),
    ("SUMMARY:", EventField::Summary),
    ("DESCRIPTION:", EventField::Description),
    ("DTSTART;", EventField::Start),
    ("DTEND;", EventField::End),
    ("LOCATION:", EventField::Location),
    ("RDATE:", EventField::Recurrence),
];

const ALARM_FIELDS: [(&str, AlarmField); 2] = [
    ("DESCRIPTION:", AlarmField::Description),
    ("TRIGGER:", AlarmField::Trigger),
];

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParseState {
    #[default]
    Idle,
    InEvent(CalendarEvent),
    InAlarm(CalendarEvent, CalendarReminder),
}

/// Advances the scanner by one trimmed line. Returns the next state and the
/// event completed by this line, if any.
pub fn step(
    state: ParseState,
    line: &str,
    anchor: ZoneAnchor,
) -> (ParseState, Option<CalendarEvent>) {
    if line.starts_with(BEGIN_EVENT) {
        if !matches!(state, ParseState::Idle) {
            debug!("[Calendar] Discarding unterminated event");
        }
        return (ParseState::InEvent(CalendarEvent::default()), None);
    }

    match state {
        ParseState::Idle => (ParseState::Idle, None),

        ParseState::InEvent(mut event) => {
            if line.starts_with(END_EVENT) {
                (ParseState::Idle, Some(event))
            } else if line.starts_with(BEGIN_ALARM) {
                (ParseState::InAlarm(event, CalendarReminder::default()), None)
            } else {
                if let Some((field, value)) = lookup(&EVENT_FIELDS, line) {
                    apply_event_field(&mut event, field, value, anchor);
                }
                (ParseState::InEvent(event), None)
            }
        }

        ParseState::InAlarm(mut event, mut reminder) => {
            if line.starts_with(END_ALARM) {
                event.reminders.push(reminder);
                (ParseState::InEvent(event), None)
            } else if line.starts_with(END_EVENT) {
                debug!("[Calendar] Dropping unterminated alarm");
                (ParseState::Idle, Some(event))
            } else if line.starts_with(BEGIN_ALARM) {
                (ParseState::InAlarm(event, CalendarReminder::default()), None)
            } else {
                if let Some((field, value)) = lookup(&ALARM_FIELDS, line) {
                    match field {
                        AlarmField::Description => reminder.description = value.to_string(),
                        AlarmField::Trigger => reminder.trigger = value.to_string(),
                    }
                }
                (ParseState::InAlarm(event, reminder), None)
            }
        }
    }
}

fn lookup<'a, F: Copy>(table: &[(&str, F)], line: &'a str) -> Option<(F, &'a str)> {
    table
        .iter()
        .find(|(prefix, _)| line.starts_with(prefix))
        .map(|(_, field)| (*field, value_of(line)))
}

fn value_of(line: &str) -> &str {
    match line.find(':') {
        Some(pos) => &line[pos + 1..],
        None => "",
    }
}

fn apply_event_field(event: &mut CalendarEvent, field: EventField, value: &str, anchor: ZoneAnchor) {
    match field {
        EventField::Uid => event.uid = value.to_string(),
        EventField::Summary => event.title = value.to_string(),
        EventField::Description => event.description = value.to_string(),
        EventField::Start => event.start_timestamp = parse_ical_date(value, anchor),
        EventField::End => event.end_timestamp = parse_ical_date(value, anchor),
        EventField::Location => event.location = value.to_string(),
        EventField::Recurrence => event.recurrence = value.to_string(),
    }
}

pub fn parse_calendar_events(ical_data: &str, anchor: ZoneAnchor) -> Vec<CalendarEvent> {
    let mut events = Vec::new();
    let mut state = ParseState::Idle;

    for line in ical_data.lines() {
        let (next, completed) = step(state, line.trim(), anchor);
        state = next;
        events.extend(completed);
    }

    if events.is_empty() && !ical_data.trim().is_empty() {
        log::warn!(
            "[Calendar] Parsed 0 events from {} bytes of calendar data",
            ical_data.len()
        );
    }

    events
}
