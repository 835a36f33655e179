// Persisted snapshot of the entries seen by the previous pull.
//
// Entries are stored flat, one key per field and index (`TITLE_0`, `TEXT_0`,
// `DATA_0`, `TITLE_1`, ...). Loading stops at the first index without a
// title; saving clears the scope and rewrites it.

use crate::error::AppResult;
use crate::models::NotificationEntry;
use async_trait::async_trait;
use log::warn;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

const TITLE_KEY: &str = "TITLE_";
const TEXT_KEY: &str = "TEXT_";
const DATA_KEY: &str = "DATA_";

const MISSING_TEXT: &str = "-";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, scope: &str, key: &str) -> AppResult<Option<String>>;

    /// Drops every key of `scope` and stores `pairs` in its place.
    async fn replace_all(&self, scope: &str, pairs: Vec<(String, String)>) -> AppResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    scopes: Mutex<HashMap<String, HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_count(&self, scope: &str) -> usize {
        self.lock().get(scope).map_or(0, HashMap::len)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, HashMap<String, String>>> {
        self.scopes.lock().unwrap_or_else(|poisoned| {
            warn!("[Notify] Snapshot store lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, scope: &str, key: &str) -> AppResult<Option<String>> {
        Ok(self.lock().get(scope).and_then(|keys| keys.get(key)).cloned())
    }

    async fn replace_all(&self, scope: &str, pairs: Vec<(String, String)>) -> AppResult<()> {
        self.lock()
            .insert(scope.to_string(), pairs.into_iter().collect());
        Ok(())
    }
}

pub async fn load_entries(
    store: &dyn KeyValueStore,
    scope: &str,
) -> AppResult<Vec<NotificationEntry>> {
    let mut entries: Vec<NotificationEntry> = Vec::new();

    for index in 0.. {
        let Some(title) = store.get(scope, &format!("{}{}", TITLE_KEY, index)).await? else {
            break;
        };
        let text = store
            .get(scope, &format!("{}{}", TEXT_KEY, index))
            .await?
            .unwrap_or_else(|| MISSING_TEXT.to_string());
        let data = store
            .get(scope, &format!("{}{}", DATA_KEY, index))
            .await?
            .unwrap_or_default();

        let entry = NotificationEntry { title, text, data };
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    }

    Ok(entries)
}

pub async fn save_entries(
    store: &dyn KeyValueStore,
    scope: &str,
    entries: &[NotificationEntry],
) -> AppResult<()> {
    let mut pairs = Vec::with_capacity(entries.len() * 3);
    for (index, entry) in entries.iter().enumerate() {
        pairs.push((format!("{}{}", TITLE_KEY, index), entry.title.clone()));
        pairs.push((format!("{}{}", TEXT_KEY, index), entry.text.clone()));
        pairs.push((format!("{}{}", DATA_KEY, index), entry.data.clone()));
    }
    store.replace_all(scope, pairs).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<NotificationEntry> {
        vec![
            NotificationEntry::new("First", "one", "https://example.com/1"),
            NotificationEntry::new("Second", "two", "intent:app.Main"),
        ]
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = MemoryKeyValueStore::new();
        save_entries(&store, "news", &entries()).await.unwrap();

        assert_eq!(store.key_count("news"), 6);
        assert_eq!(load_entries(&store, "news").await.unwrap(), entries());
    }

    #[tokio::test]
    async fn test_save_clears_previous_snapshot() {
        let store = MemoryKeyValueStore::new();
        save_entries(&store, "news", &entries()).await.unwrap();
        save_entries(&store, "news", &entries()[..1]).await.unwrap();

        assert_eq!(store.key_count("news"), 3);
        assert_eq!(load_entries(&store, "news").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_load_stops_at_first_gap() {
        let store = MemoryKeyValueStore::new();
        store
            .replace_all(
                "news",
                vec![
                    ("TITLE_0".to_string(), "a".to_string()),
                    ("TITLE_2".to_string(), "unreachable".to_string()),
                ],
            )
            .await
            .unwrap();

        let loaded = load_entries(&store, "news").await.unwrap();
        assert_eq!(loaded, vec![NotificationEntry::new("a", "-", "")]);
    }

    #[tokio::test]
    async fn test_scopes_are_separate() {
        let store = MemoryKeyValueStore::new();
        save_entries(&store, "news", &entries()).await.unwrap();
        assert!(load_entries(&store, "calendar").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .returning(|_, _| Err(crate::error::AppError::not_found("gone")));
        assert!(load_entries(&store, "news").await.is_err());
    }
}
