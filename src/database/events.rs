// file: src/database/events.rs
use crate::calendar::{fields, EventWrite, FieldValue, Record, ReplaceCounts};
use crate::error::{AppError, AppResult};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};

// Suffix comparison without LIKE so that `%` and `_` in uids match literally.
const UID_SUFFIX_MATCH: &str =
    "length(uid_2445) >= length(?2) AND substr(uid_2445, length(uid_2445) - length(?2) + 1) = ?2";

pub async fn insert<'e, E>(executor: E, record: &Record) -> AppResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    if record.is_empty() {
        return Err(AppError::invalid_input("Event record has no fields"));
    }

    let mut columns = Vec::with_capacity(record.len());
    for (name, _) in record.fields() {
        if !fields::is_writable_event_field(name) {
            return Err(AppError::invalid_input(format!("Unknown event field '{}'", name)));
        }
        columns.push(name);
    }

    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO events ({}) VALUES ({})",
        columns.join(", "),
        placeholders
    );

    let mut query = sqlx::query(&sql);
    for (_, value) in record.fields() {
        query = match value {
            FieldValue::Text(text) => query.bind(text.clone()),
            FieldValue::Integer(number) => query.bind(*number),
            FieldValue::Null => query.bind(None::<i64>),
        };
    }

    let result = query.execute(executor).await?;
    Ok(result.last_insert_rowid())
}

pub async fn insert_reminder<'e, E>(executor: E, event_id: i64, minutes: u32) -> AppResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("INSERT INTO reminders (event_id, minutes, method) VALUES (?, ?, ?)")
        .bind(event_id)
        .bind(minutes as i64)
        .bind(fields::METHOD_ALERT)
        .execute(executor)
        .await?;

    Ok(result.last_insert_rowid())
}

pub async fn soft_delete_all<'e, E>(
    executor: E,
    calendar_id: i64,
    uid_suffix: Option<&str>,
) -> AppResult<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = match uid_suffix {
        Some(suffix) => {
            let sql = format!(
                "UPDATE events SET deleted = 1 WHERE calendar_id = ?1 AND deleted = 0 AND {}",
                UID_SUFFIX_MATCH
            );
            sqlx::query(&sql)
                .bind(calendar_id)
                .bind(suffix)
                .execute(executor)
                .await?
        }
        None => {
            sqlx::query("UPDATE events SET deleted = 1 WHERE calendar_id = ? AND deleted = 0")
                .bind(calendar_id)
                .execute(executor)
                .await?
        }
    };

    Ok(result.rows_affected())
}

/// Soft delete plus inserts in one transaction, rolled back on the first
/// failing write.
pub async fn replace_slice(
    pool: &SqlitePool,
    calendar_id: i64,
    uid_suffix: Option<&str>,
    events: &[EventWrite],
) -> AppResult<ReplaceCounts> {
    let mut tx = pool.begin().await?;
    let mut counts = ReplaceCounts {
        deleted: soft_delete_all(&mut *tx, calendar_id, uid_suffix).await?,
        ..ReplaceCounts::default()
    };

    for event in events {
        let event_id = insert(&mut *tx, &event.record).await?;
        counts.events += 1;
        for minutes in &event.reminder_minutes {
            insert_reminder(&mut *tx, event_id, *minutes).await?;
            counts.reminders += 1;
        }
    }

    tx.commit().await?;
    Ok(counts)
}

pub async fn soft_delete(pool: &SqlitePool, event_id: i64) -> AppResult<u64> {
    let result = sqlx::query("UPDATE events SET deleted = 1 WHERE id = ?")
        .bind(event_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn query_active(
    pool: &SqlitePool,
    calendar_id: i64,
    uid_suffix: Option<&str>,
) -> AppResult<Vec<Record>> {
    let select = "SELECT id, calendar_id, uid_2445, title, description, dtstart, dtend, \
                  event_location, event_timezone, rdate, deleted FROM events";

    let rows = match uid_suffix {
        Some(suffix) => {
            let sql = format!(
                "{} WHERE calendar_id = ?1 AND deleted != 1 AND {} ORDER BY dtstart ASC, id ASC",
                select, UID_SUFFIX_MATCH
            );
            sqlx::query(&sql)
                .bind(calendar_id)
                .bind(suffix)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!(
                "{} WHERE calendar_id = ? AND deleted != 1 ORDER BY dtstart ASC, id ASC",
                select
            );
            sqlx::query(&sql).bind(calendar_id).fetch_all(pool).await?
        }
    };

    rows.iter().map(row_to_record).collect()
}

pub async fn reminder_minutes(pool: &SqlitePool, event_id: i64) -> AppResult<Vec<i64>> {
    let minutes = sqlx::query_scalar("SELECT minutes FROM reminders WHERE event_id = ? ORDER BY id")
        .bind(event_id)
        .fetch_all(pool)
        .await?;

    Ok(minutes)
}

fn row_to_record(row: &SqliteRow) -> AppResult<Record> {
    Ok(Record::new()
        .with(fields::EVENT_ID, row.try_get::<i64, _>("id")?)
        .with(fields::CALENDAR_ID, row.try_get::<i64, _>("calendar_id")?)
        .with(fields::UID, row.try_get::<String, _>("uid_2445")?)
        .with(fields::TITLE, row.try_get::<String, _>("title")?)
        .with(fields::DESCRIPTION, row.try_get::<String, _>("description")?)
        .with(fields::DTSTART, row.try_get::<i64, _>("dtstart")?)
        .with(fields::DTEND, row.try_get::<Option<i64>, _>("dtend")?)
        .with(fields::EVENT_LOCATION, row.try_get::<String, _>("event_location")?)
        .with(
            fields::EVENT_TIMEZONE,
            text_or_null(row.try_get::<Option<String>, _>("event_timezone")?),
        )
        .with(fields::RDATE, row.try_get::<String, _>("rdate")?)
        .with(fields::DELETED, row.try_get::<i64, _>("deleted")?))
}

fn text_or_null(value: Option<String>) -> FieldValue {
    value.map_or(FieldValue::Null, FieldValue::Text)
}
