// file: src/database/mod.rs

use crate::calendar::{CalendarInfo, CalendarStore, EventWrite, Record, ReplaceCounts};
use crate::error::AppResult;
use crate::notify::KeyValueStore;
use anyhow::Context;
use async_trait::async_trait;
use log::info;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePool, Sqlite};
use std::path::Path;
use std::time::Instant;

pub mod calendars;
pub mod events;
pub mod snapshots;

/// SQLite-backed calendar store and snapshot store. `replace_events` and
/// snapshot saves run in a transaction; the other calls stand alone.
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create data directory {:?}", parent))?;
            }
        }
        Self::connect(&format!("sqlite:{}?mode=rwc", path.display())).await
    }

    pub async fn connect(db_url: &str) -> AppResult<Self> {
        // Create database if it doesn't exist
        let db_exists = Sqlite::database_exists(db_url)
            .await
            .context("Failed to check if database exists")?;
        if !db_exists {
            info!("Creating database");
            Sqlite::create_database(db_url)
                .await
                .context("Failed to create database")?;
        }

        let pool = SqlitePool::connect(db_url)
            .await
            .context("Failed to connect to database")?;

        run_schema(&pool).await.context("Failed to run database schema")?;

        info!("Database initialized successfully");

        Ok(Database { pool })
    }

    pub async fn add_calendar(&self, display_name: &str, account_type: &str) -> AppResult<i64> {
        calendars::add(&self.pool, display_name, account_type).await
    }

    pub async fn delete_calendar(&self, calendar_id: i64) -> AppResult<()> {
        calendars::mark_deleted(&self.pool, calendar_id).await
    }

    pub async fn reminder_minutes(&self, event_id: i64) -> AppResult<Vec<i64>> {
        events::reminder_minutes(&self.pool, event_id).await
    }
}

#[async_trait]
impl CalendarStore for Database {
    async fn insert_event(&self, record: Record) -> AppResult<i64> {
        events::insert(&self.pool, &record).await
    }

    async fn insert_reminder(&self, event_id: i64, minutes: u32) -> AppResult<i64> {
        events::insert_reminder(&self.pool, event_id, minutes).await
    }

    async fn soft_delete_events(
        &self,
        calendar_id: i64,
        uid_suffix: Option<String>,
    ) -> AppResult<u64> {
        let started = Instant::now();
        let count = events::soft_delete_all(&self.pool, calendar_id, uid_suffix.as_deref()).await?;
        crate::utils::logging::log_database_operation(
            "soft delete",
            "events",
            started.elapsed().as_millis() as u64,
        );
        Ok(count)
    }

    async fn replace_events(
        &self,
        calendar_id: i64,
        uid_suffix: Option<String>,
        events: Vec<EventWrite>,
    ) -> AppResult<ReplaceCounts> {
        let started = Instant::now();
        let counts =
            events::replace_slice(&self.pool, calendar_id, uid_suffix.as_deref(), &events).await?;
        crate::utils::logging::log_database_operation(
            "replace",
            "events",
            started.elapsed().as_millis() as u64,
        );
        Ok(counts)
    }

    async fn soft_delete_event(&self, event_id: i64) -> AppResult<u64> {
        events::soft_delete(&self.pool, event_id).await
    }

    async fn query_events(
        &self,
        calendar_id: i64,
        uid_suffix: Option<String>,
    ) -> AppResult<Vec<Record>> {
        events::query_active(&self.pool, calendar_id, uid_suffix.as_deref()).await
    }

    async fn list_calendars(&self, account_type: &str) -> AppResult<Vec<CalendarInfo>> {
        calendars::list(&self.pool, account_type).await
    }
}

#[async_trait]
impl KeyValueStore for Database {
    async fn get(&self, scope: &str, key: &str) -> AppResult<Option<String>> {
        snapshots::get(&self.pool, scope, key).await
    }

    async fn replace_all(&self, scope: &str, pairs: Vec<(String, String)>) -> AppResult<()> {
        snapshots::replace_all(&self.pool, scope, &pairs).await
    }
}

async fn run_schema(pool: &SqlitePool) -> AppResult<()> {
    let schema = include_str!("schema.sql");

    let mut current_statement = String::new();
    for line in schema.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") || trimmed.is_empty() {
            continue;
        }

        current_statement.push_str(line);
        current_statement.push('\n');

        if trimmed.ends_with(';') {
            sqlx::query(&current_statement).execute(pool).await?;
            current_statement.clear();
        }
    }
    Ok(())
}
