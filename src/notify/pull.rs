// One pull-notification cycle: fetch, parse, diff against the stored
// snapshot, notify about what is new.

use crate::config::DEFAULT_MAX_NOTIFICATIONS;
use crate::error::AppResult;
use crate::models::{NotificationEntry, NotificationTarget};
use crate::notify::notifier::{notification_id, IconRefs, Notification, Notifier};
use crate::notify::snapshot::{load_entries, save_entries, KeyValueStore};
use crate::utils::logging;
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub const CATEGORY_PARAMETER_KEY: &str = "category";
pub const SMALL_ICON_PARAMETER_KEY: &str = "smallIcon";
pub const LARGE_ICON_PARAMETER_KEY: &str = "largeIcon";

pub const DEFAULT_CATEGORY: &str = "webshell-bridge";
pub const DEFAULT_SMALL_ICON: i64 = 0;

/// String parameters handed to a cycle by whoever schedules it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkParams {
    values: HashMap<String, String>,
}

impl WorkParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// `None` when the key is missing or not an integer.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get_string(key).and_then(|value| value.trim().parse().ok())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkOutcome {
    Success,
    Failure,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PullSource: Send + Sync {
    /// Raw contents to parse, or `None` when nothing could be fetched.
    async fn make_requests(&self, params: &WorkParams) -> AppResult<Option<Vec<String>>>;

    fn parse_content(&self, content: &str, params: &WorkParams) -> Vec<NotificationEntry>;
}

/// Entries of `current` without a value-equal entry in `old`, in `current`
/// order.
pub fn updated_entries(
    current: &[NotificationEntry],
    old: &[NotificationEntry],
) -> Vec<NotificationEntry> {
    let old: HashSet<&NotificationEntry> = old.iter().collect();
    current
        .iter()
        .filter(|entry| !old.contains(entry))
        .cloned()
        .collect()
}

fn same_entries(current: &[NotificationEntry], old: &[NotificationEntry]) -> bool {
    let current: HashSet<&NotificationEntry> = current.iter().collect();
    let old: HashSet<&NotificationEntry> = old.iter().collect();
    current == old
}

pub struct PullWorker {
    scope: String,
    source: Arc<dyn PullSource>,
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    max_notifications: usize,
}

impl PullWorker {
    /// `scope` names the snapshot this worker owns in `store`.
    pub fn new(
        scope: impl Into<String>,
        source: Arc<dyn PullSource>,
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            scope: scope.into(),
            source,
            store,
            notifier,
            max_notifications: DEFAULT_MAX_NOTIFICATIONS,
        }
    }

    pub fn with_max_notifications(mut self, max_notifications: usize) -> Self {
        self.max_notifications = max_notifications;
        self
    }

    pub async fn run(&self, params: &WorkParams) -> WorkOutcome {
        match self.pull(params).await {
            Ok(Some(updated)) => {
                info!(
                    "[Notify] {}: {} new entries",
                    self.scope,
                    updated.len()
                );
                self.make_notifications(&updated, params);
                WorkOutcome::Success
            }
            Ok(None) => {
                warn!("[Notify] {}: source returned no content", self.scope);
                WorkOutcome::Failure
            }
            Err(e) => {
                logging::log_error_with_context(&e, "Notify");
                WorkOutcome::Failure
            }
        }
    }

    /// Fetches and parses the current entries, replaces the stored snapshot
    /// when it differs, and returns the entries that were not in it.
    pub async fn pull(&self, params: &WorkParams) -> AppResult<Option<Vec<NotificationEntry>>> {
        let Some(contents) = self.source.make_requests(params).await? else {
            return Ok(None);
        };

        let mut current: Vec<NotificationEntry> = Vec::new();
        for content in &contents {
            for entry in self.source.parse_content(content, params) {
                if !current.contains(&entry) {
                    current.push(entry);
                }
            }
        }

        let old = load_entries(self.store.as_ref(), &self.scope).await?;
        let updated = updated_entries(&current, &old);

        if !same_entries(&current, &old) {
            debug!("[Notify] {}: saving snapshot of {} entries", self.scope, current.len());
            save_entries(self.store.as_ref(), &self.scope, &current).await?;
        }

        Ok(Some(updated))
    }

    /// Posts at most `max_notifications` of `entries`, starting from the first
    /// and posting in reverse order. Returns how many were posted.
    pub fn make_notifications(&self, entries: &[NotificationEntry], params: &WorkParams) -> usize {
        let category = params
            .get_string(CATEGORY_PARAMETER_KEY)
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string();
        let small = params
            .get_int(SMALL_ICON_PARAMETER_KEY)
            .unwrap_or(DEFAULT_SMALL_ICON);
        let icons = IconRefs {
            small,
            large: params.get_int(LARGE_ICON_PARAMETER_KEY).unwrap_or(small),
        };

        let shown = entries.len().min(self.max_notifications);
        let mut posted = 0;
        for entry in entries[..shown].iter().rev() {
            let Some(target) = NotificationTarget::from_entry_data(&entry.data) else {
                debug!("[Notify] No target for entry '{}'", entry.title);
                continue;
            };

            let notification = Notification {
                title: entry.title.clone(),
                text: entry.text.clone(),
                target,
                icons,
                category: category.clone(),
                id: notification_id(),
            };
            match self.notifier.notify(notification) {
                Ok(()) => posted += 1,
                Err(e) => warn!("[Notify] Failed to post '{}': {}", entry.title, e.to_safe_string()),
            }
        }
        posted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::notify::notifier::MockNotifier;
    use crate::notify::snapshot::MemoryKeyValueStore;
    use std::sync::Mutex;

    fn entry(n: usize) -> NotificationEntry {
        NotificationEntry::new(
            format!("Entry {}", n),
            "text",
            format!("https://example.com/{}", n),
        )
    }

    /// Source returning one content per call, each line an entry title.
    fn lines_source(content: &'static str) -> MockPullSource {
        let mut source = MockPullSource::new();
        source
            .expect_make_requests()
            .returning(move |_| Ok(Some(vec![content.to_string()])));
        source.expect_parse_content().returning(|content, _| {
            content
                .lines()
                .map(|line| NotificationEntry::new(line, "text", format!("https://example.com/{}", line)))
                .collect()
        });
        source
    }

    fn recording_notifier() -> (MockNotifier, Arc<Mutex<Vec<String>>>) {
        let titles = Arc::new(Mutex::new(Vec::new()));
        let sink = titles.clone();
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().returning(move |notification| {
            sink.lock().unwrap().push(notification.title);
            Ok(())
        });
        (notifier, titles)
    }

    #[test]
    fn test_updated_entries() {
        let current = vec![entry(1), entry(2), entry(3)];
        let old = vec![entry(2)];
        assert_eq!(updated_entries(&current, &old), vec![entry(1), entry(3)]);
        assert!(updated_entries(&current, &current).is_empty());
    }

    #[test]
    fn test_work_params() {
        let params = WorkParams::new().with("smallIcon", "17").with("category", "News");
        assert_eq!(params.get_int("smallIcon"), Some(17));
        assert_eq!(params.get_int("category"), None);
        assert_eq!(params.get_string("category"), Some("News"));
        assert_eq!(params.get_string("largeIcon"), None);
    }

    #[tokio::test]
    async fn test_second_identical_pull_has_nothing_new() {
        let worker = PullWorker::new(
            "news",
            Arc::new(lines_source("a\nb")),
            Arc::new(MemoryKeyValueStore::new()),
            Arc::new(MockNotifier::new()),
        );

        let params = WorkParams::new();
        assert_eq!(worker.pull(&params).await.unwrap().unwrap().len(), 2);
        assert!(worker.pull(&params).await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_content_fails_cycle() {
        let mut source = MockPullSource::new();
        source.expect_make_requests().returning(|_| Ok(None));
        source.expect_parse_content().never();
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().never();

        let worker = PullWorker::new(
            "news",
            Arc::new(source),
            Arc::new(MemoryKeyValueStore::new()),
            Arc::new(notifier),
        );
        assert_eq!(worker.run(&WorkParams::new()).await, WorkOutcome::Failure);
    }

    #[tokio::test]
    async fn test_source_error_fails_cycle() {
        let mut source = MockPullSource::new();
        source
            .expect_make_requests()
            .returning(|_| Err(AppError::notification("feed unreachable")));

        let worker = PullWorker::new(
            "news",
            Arc::new(source),
            Arc::new(MemoryKeyValueStore::new()),
            Arc::new(MockNotifier::new()),
        );
        assert_eq!(worker.run(&WorkParams::new()).await, WorkOutcome::Failure);
    }

    #[tokio::test]
    async fn test_notifies_first_three_in_reverse() {
        let (notifier, titles) = recording_notifier();
        let worker = PullWorker::new(
            "news",
            Arc::new(lines_source("a\nb\nc\nd\ne")),
            Arc::new(MemoryKeyValueStore::new()),
            Arc::new(notifier),
        );

        assert_eq!(worker.run(&WorkParams::new()).await, WorkOutcome::Success);
        assert_eq!(*titles.lock().unwrap(), vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_max_notifications_is_configurable() {
        let (notifier, titles) = recording_notifier();
        let worker = PullWorker::new(
            "news",
            Arc::new(lines_source("a\nb\nc")),
            Arc::new(MemoryKeyValueStore::new()),
            Arc::new(notifier),
        )
        .with_max_notifications(1);

        worker.run(&WorkParams::new()).await;
        assert_eq!(*titles.lock().unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_removed_entries_update_snapshot() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let first = PullWorker::new(
            "news",
            Arc::new(lines_source("a\nb")),
            store.clone(),
            Arc::new(MockNotifier::new()),
        );
        first.pull(&WorkParams::new()).await.unwrap();

        let second = PullWorker::new(
            "news",
            Arc::new(lines_source("a")),
            store.clone(),
            Arc::new(MockNotifier::new()),
        );
        assert!(second.pull(&WorkParams::new()).await.unwrap().unwrap().is_empty());
        assert_eq!(store.key_count("news"), 3);
    }

    #[test]
    fn test_notification_fields_from_params() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|n| {
                n.category == "Club"
                    && n.icons == IconRefs { small: 5, large: 5 }
                    && n.target
                        == NotificationTarget::Component {
                            class_name: "app.Main".to_string(),
                            url: Some("https://example.com/x".to_string()),
                        }
            })
            .times(1)
            .returning(|_| Ok(()));

        let worker = PullWorker::new(
            "news",
            Arc::new(MockPullSource::new()),
            Arc::new(MemoryKeyValueStore::new()),
            Arc::new(notifier),
        );
        let entries = vec![
            NotificationEntry::new("t", "x", "intent:app.Main,https://example.com/x"),
            NotificationEntry::new("skipped", "x", "ftp://example.com"),
        ];
        let params = WorkParams::new().with("category", "Club").with("smallIcon", "5");
        assert_eq!(worker.make_notifications(&entries, &params), 1);
    }
}
