//! Request bodies captured by the page script before the request fires.
//!
//! The web view never exposes request bodies to the interception hook, so the
//! page posts each body here first, keyed by the target URL and a per-request
//! token. Entries are write-once and are kept (not consumed) on read because
//! the web view may reissue the same request. Growth is bounded by a capacity
//! limit (oldest capture evicted first) and a time-to-live.

use crate::error::AppResult;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BodyKey {
    url: String,
    request_id: String,
}

impl BodyKey {
    fn new(url: &str, request_id: &str) -> Self {
        Self {
            url: url.to_string(),
            request_id: request_id.to_string(),
        }
    }
}

#[derive(Debug)]
struct CapturedBody {
    body: String,
    captured_at: Instant,
}

#[derive(Debug, Default)]
struct Inner {
    bodies: HashMap<BodyKey, CapturedBody>,
    order: VecDeque<BodyKey>,
}

/// Message shape posted by the script-side capture hook.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureMessage {
    pub url: String,
    pub request_id: String,
    pub body: String,
}

#[derive(Debug)]
pub struct PendingBodies {
    inner: Mutex<Inner>,
    capacity: usize,
    ttl: Duration,
}

impl PendingBodies {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Stores `body` unless an entry for the key already exists.
    /// Returns whether the body was stored.
    pub fn capture(&self, url: &str, request_id: &str, body: impl Into<String>) -> bool {
        let key = BodyKey::new(url, request_id);
        let mut inner = self.lock();
        self.expire(&mut inner, Instant::now());

        if inner.bodies.contains_key(&key) {
            debug!("[Router] Body for {} ({}) already captured", url, request_id);
            return false;
        }

        while inner.bodies.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    debug!("[Router] Evicting captured body for {}", oldest.url);
                    inner.bodies.remove(&oldest);
                }
                None => break,
            }
        }

        inner.order.push_back(key.clone());
        inner.bodies.insert(
            key,
            CapturedBody {
                body: body.into(),
                captured_at: Instant::now(),
            },
        );
        true
    }

    /// Parses a JSON capture message from the page script and stores it.
    pub fn capture_json(&self, message: &str) -> AppResult<bool> {
        let message: CaptureMessage = serde_json::from_str(message)?;
        Ok(self.capture(&message.url, &message.request_id, message.body))
    }

    /// Stores `body` under a freshly issued token and returns the token.
    pub fn capture_with_new_token(&self, url: &str, body: impl Into<String>) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        self.capture(url, &token, body);
        token
    }

    pub fn get(&self, url: &str, request_id: &str) -> Option<String> {
        let mut inner = self.lock();
        self.expire(&mut inner, Instant::now());
        inner
            .bodies
            .get(&BodyKey::new(url, request_id))
            .map(|captured| captured.body.clone())
    }

    pub fn len(&self) -> usize {
        let mut inner = self.lock();
        self.expire(&mut inner, Instant::now());
        inner.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves the map structurally intact.
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("[Router] Pending body lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    // Captures are inserted in time order, so expired ones sit at the front.
    fn expire(&self, inner: &mut Inner, now: Instant) {
        while let Some(front) = inner.order.front() {
            let expired = inner
                .bodies
                .get(front)
                .map(|captured| now.duration_since(captured.captured_at) >= self.ttl)
                .unwrap_or(true);
            if !expired {
                break;
            }
            if let Some(key) = inner.order.pop_front() {
                inner.bodies.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn bodies() -> PendingBodies {
        PendingBodies::new(8, Duration::from_secs(60))
    }

    #[test]
    fn test_capture_and_get() {
        let pending = bodies();
        assert!(pending.capture("https://api.example.com/items", "1", r#"{"a":1}"#));
        assert_eq!(
            pending.get("https://api.example.com/items", "1").as_deref(),
            Some(r#"{"a":1}"#)
        );
        // Reads do not consume
        assert!(pending.get("https://api.example.com/items", "1").is_some());
    }

    #[test]
    fn test_key_requires_both_url_and_request_id() {
        let pending = bodies();
        pending.capture("https://api.example.com/items", "1", "body");
        assert!(pending.get("https://api.example.com/items", "2").is_none());
        assert!(pending.get("https://api.example.com/other", "1").is_none());
    }

    #[test]
    fn test_entries_are_write_once() {
        let pending = bodies();
        assert!(pending.capture("https://a.example.com", "1", "first"));
        assert!(!pending.capture("https://a.example.com", "1", "second"));
        assert_eq!(pending.get("https://a.example.com", "1").as_deref(), Some("first"));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let pending = PendingBodies::new(2, Duration::from_secs(60));
        pending.capture("https://a.example.com", "1", "one");
        pending.capture("https://a.example.com", "2", "two");
        pending.capture("https://a.example.com", "3", "three");

        assert_eq!(pending.len(), 2);
        assert!(pending.get("https://a.example.com", "1").is_none());
        assert!(pending.get("https://a.example.com", "3").is_some());
    }

    #[test]
    fn test_ttl_expires_entries() {
        let pending = PendingBodies::new(8, Duration::from_millis(0));
        pending.capture("https://a.example.com", "1", "one");
        assert!(pending.get("https://a.example.com", "1").is_none());
        assert!(pending.is_empty());
    }

    #[test]
    fn test_capture_json_message() {
        let pending = bodies();
        let stored = pending
            .capture_json(r#"{"url":"https://a.example.com/x","requestId":"r7","body":"payload"}"#)
            .unwrap();
        assert!(stored);
        assert_eq!(pending.get("https://a.example.com/x", "r7").as_deref(), Some("payload"));
        assert!(pending.capture_json("not json").is_err());
    }

    #[test]
    fn test_issued_tokens_are_unique() {
        let pending = bodies();
        let first = pending.capture_with_new_token("https://a.example.com", "one");
        let second = pending.capture_with_new_token("https://a.example.com", "two");
        assert_ne!(first, second);
        assert_eq!(pending.get("https://a.example.com", &second).as_deref(), Some("two"));
    }

    #[test]
    fn test_concurrent_capture() {
        let pending = Arc::new(PendingBodies::new(1000, Duration::from_secs(60)));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let pending = pending.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        pending.capture("https://a.example.com", &format!("{}-{}", t, i), "b");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(pending.len(), 400);
    }
}
