// file: src/database/calendars.rs
use crate::calendar::CalendarInfo;
use crate::error::AppResult;
use sqlx::{Row, SqlitePool};

pub async fn add(pool: &SqlitePool, display_name: &str, account_type: &str) -> AppResult<i64> {
    let result = sqlx::query("INSERT INTO calendars (display_name, account_type) VALUES (?, ?)")
        .bind(display_name)
        .bind(account_type)
        .execute(pool)
        .await?;

    Ok(result.last_insert_rowid())
}

pub async fn list(pool: &SqlitePool, account_type: &str) -> AppResult<Vec<CalendarInfo>> {
    let rows = sqlx::query(
        r#"
        SELECT id, display_name, account_type
        FROM calendars
        WHERE account_type = ? AND deleted != 1
        ORDER BY id ASC
        "#,
    )
    .bind(account_type)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> AppResult<CalendarInfo> {
            Ok(CalendarInfo {
                id: row.try_get("id")?,
                display_name: row.try_get("display_name")?,
                account_type: row.try_get("account_type")?,
            })
        })
        .collect()
}

pub async fn mark_deleted(pool: &SqlitePool, calendar_id: i64) -> AppResult<()> {
    sqlx::query("UPDATE calendars SET deleted = 1 WHERE id = ?")
        .bind(calendar_id)
        .execute(pool)
        .await?;

    Ok(())
}
