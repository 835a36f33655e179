// file: src/database/snapshots.rs
use crate::error::AppResult;
use sqlx::SqlitePool;

pub async fn get(pool: &SqlitePool, scope: &str, key: &str) -> AppResult<Option<String>> {
    let value = sqlx::query_scalar("SELECT value FROM snapshot_entries WHERE scope = ? AND key = ?")
        .bind(scope)
        .bind(key)
        .fetch_optional(pool)
        .await?;

    Ok(value)
}

/// Clears the scope and writes `pairs` in one transaction.
pub async fn replace_all(
    pool: &SqlitePool,
    scope: &str,
    pairs: &[(String, String)],
) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM snapshot_entries WHERE scope = ?")
        .bind(scope)
        .execute(&mut *tx)
        .await?;

    for (key, value) in pairs {
        sqlx::query("INSERT OR REPLACE INTO snapshot_entries (scope, key, value) VALUES (?, ?, ?)")
            .bind(scope)
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}
