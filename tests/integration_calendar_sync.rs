use chrono_tz::Europe::Berlin;
use tempfile::NamedTempFile;
use webshell_bridge::calendar::{fields, import_calendar, CalendarStore, ImportOptions, ZoneAnchor};
use webshell_bridge::Database;

async fn create_test_database() -> Database {
    let temp_file = NamedTempFile::new().unwrap();
    let (_, path) = temp_file.keep().unwrap();
    Database::connect(&format!("sqlite:{}", path.to_str().unwrap()))
        .await
        .unwrap()
}

fn options() -> ImportOptions {
    ImportOptions {
        event_timezone: "Europe/Berlin".to_string(),
        anchor: ZoneAnchor::Named(Berlin),
    }
}

fn calendar_with(events: &[(&str, &str, &str)]) -> String {
    let mut ics = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n");
    for (uid, summary, trigger) in events {
        ics.push_str("BEGIN:VEVENT\r\n");
        ics.push_str(&format!("UID:{}\r\n", uid));
        ics.push_str(&format!("SUMMARY:{}\r\n", summary));
        ics.push_str("DTSTART;TZID=Europe/Berlin:20240610T080000Z\r\n");
        ics.push_str("DTEND;TZID=Europe/Berlin:20240610T090000Z\r\n");
        if !trigger.is_empty() {
            ics.push_str("BEGIN:VALARM\r\nDESCRIPTION:Reminder\r\n");
            ics.push_str(&format!("TRIGGER:{}\r\n", trigger));
            ics.push_str("END:VALARM\r\n");
        }
        ics.push_str("END:VEVENT\r\n");
    }
    ics.push_str("END:VCALENDAR\r\n");
    ics
}

#[tokio::test]
async fn test_reimport_with_no_events_clears_only_that_suffix() {
    let db = create_test_database().await;
    let calendar_id = db.add_calendar("Family", "local").await.unwrap();

    let club = calendar_with(&[("1@club", "Training", "")]);
    let school = calendar_with(&[("1@school", "Exam", ""), ("2@school", "Trip", "")]);
    import_calendar(&db, calendar_id, &club, Some("@club"), &options())
        .await
        .unwrap();
    import_calendar(&db, calendar_id, &school, Some("@school"), &options())
        .await
        .unwrap();

    let empty = calendar_with(&[]);
    let result = import_calendar(&db, calendar_id, &empty, Some("@club"), &options())
        .await
        .unwrap();
    assert_eq!(result.events_deleted, 1);
    assert_eq!(result.events_imported, 0);

    let club_events = db
        .query_events(calendar_id, Some("@club".to_string()))
        .await
        .unwrap();
    assert!(club_events.is_empty());

    let school_events = db
        .query_events(calendar_id, Some("@school".to_string()))
        .await
        .unwrap();
    let uids: Vec<_> = school_events
        .iter()
        .map(|record| record.text(fields::UID).unwrap_or_default())
        .collect();
    assert_eq!(uids, vec!["1@school", "2@school"]);
}

#[tokio::test]
async fn test_reimport_replaces_previous_events() {
    let db = create_test_database().await;
    let calendar_id = db.add_calendar("Family", "local").await.unwrap();
    let ics = calendar_with(&[("1@club", "Training", "-PT30M")]);

    import_calendar(&db, calendar_id, &ics, Some("@club"), &options())
        .await
        .unwrap();
    let second = import_calendar(&db, calendar_id, &ics, Some("@club"), &options())
        .await
        .unwrap();

    assert_eq!(second.events_deleted, 1);
    assert_eq!(second.events_imported, 1);
    assert_eq!(db.query_events(calendar_id, None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_only_minutes_before_triggers_create_reminders() {
    let db = create_test_database().await;
    let calendar_id = db.add_calendar("Family", "local").await.unwrap();
    let ics = calendar_with(&[("a@x", "Before", "-PT15M"), ("b@x", "After", "PT15M")]);

    let result = import_calendar(&db, calendar_id, &ics, None, &options())
        .await
        .unwrap();
    assert_eq!(result.events_imported, 2);
    assert_eq!(result.reminders_created, 1);

    let events = db.query_events(calendar_id, None).await.unwrap();
    let before = events
        .iter()
        .find(|record| record.text(fields::UID) == Some("a@x"))
        .and_then(|record| record.integer(fields::EVENT_ID))
        .unwrap();
    let after = events
        .iter()
        .find(|record| record.text(fields::UID) == Some("b@x"))
        .and_then(|record| record.integer(fields::EVENT_ID))
        .unwrap();

    assert_eq!(db.reminder_minutes(before).await.unwrap(), vec![15]);
    assert!(db.reminder_minutes(after).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_import_without_suffix_clears_whole_calendar() {
    let db = create_test_database().await;
    let calendar_id = db.add_calendar("Family", "local").await.unwrap();
    let other_id = db.add_calendar("Work", "local").await.unwrap();

    let ics = calendar_with(&[("1@club", "Training", ""), ("1@school", "Exam", "")]);
    import_calendar(&db, calendar_id, &ics, None, &options()).await.unwrap();
    import_calendar(&db, other_id, &ics, None, &options()).await.unwrap();

    let result = import_calendar(&db, calendar_id, &calendar_with(&[]), None, &options())
        .await
        .unwrap();
    assert_eq!(result.events_deleted, 2);
    assert!(db.query_events(calendar_id, None).await.unwrap().is_empty());
    assert_eq!(db.query_events(other_id, None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_stored_times_are_anchored() {
    let db = create_test_database().await;
    let calendar_id = db.add_calendar("Family", "local").await.unwrap();
    let ics = calendar_with(&[("1@club", "Training", "")]);
    import_calendar(&db, calendar_id, &ics, None, &options()).await.unwrap();

    let events = db.query_events(calendar_id, None).await.unwrap();
    // 08:00 Berlin summer time
    assert_eq!(events[0].integer(fields::DTSTART), Some(1_717_999_200_000));
    assert_eq!(events[0].text(fields::EVENT_TIMEZONE), Some("Europe/Berlin"));
}

#[tokio::test]
async fn test_failed_import_keeps_previous_events() {
    let db = create_test_database().await;
    let calendar_id = db.add_calendar("Family", "local").await.unwrap();

    let first = calendar_with(&[
        ("1@club", "Training", ""),
        ("2@club", "Match", ""),
        ("3@club", "Party", ""),
    ]);
    import_calendar(&db, calendar_id, &first, Some("@club"), &options())
        .await
        .unwrap();

    // Reminder writes now fail after the soft delete and the first insert
    sqlx::query("DROP TABLE reminders")
        .execute(&db.pool)
        .await
        .unwrap();

    let second = calendar_with(&[("4@club", "Training", "-PT15M"), ("5@club", "Match", "")]);
    let result = import_calendar(&db, calendar_id, &second, Some("@club"), &options()).await;
    assert!(result.is_err());

    let active = db
        .query_events(calendar_id, Some("@club".to_string()))
        .await
        .unwrap();
    let uids: Vec<_> = active
        .iter()
        .map(|record| record.text(fields::UID).unwrap_or_default())
        .collect();
    assert_eq!(uids, vec!["1@club", "2@club", "3@club"]);
}
