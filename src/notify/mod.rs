// Pull notifications: periodic content polls diffed against a stored snapshot.

pub mod feed;
pub mod notifier;
pub mod pull;
pub mod snapshot;

pub use feed::{FeedFetcher, FeedLoader, IcsPullSource};
pub use notifier::{notification_id, IconRefs, LogNotifier, Notification, Notifier};
pub use pull::{updated_entries, PullSource, PullWorker, WorkOutcome, WorkParams};
pub use snapshot::{load_entries, save_entries, KeyValueStore, MemoryKeyValueStore};
