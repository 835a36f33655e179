// Feed fetching and the iCalendar pull source built on it.

use crate::calendar::{parse_calendar_events, to_ical_date, ZoneAnchor};
use crate::error::{AppError, AppResult};
use crate::http_config::HttpConfig;
use crate::models::{CalendarEvent, NotificationEntry};
use crate::notify::pull::{PullSource, WorkParams};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use std::sync::Arc;

/// Whitespace separated feed URLs.
pub const URLS_PARAMETER_KEY: &str = "urls";
/// `user:password` for HTTP Basic authentication.
pub const CREDENTIALS_PARAMETER_KEY: &str = "credentials";
/// Entry data used for events without a web link of their own.
pub const LINK_PARAMETER_KEY: &str = "link";

#[async_trait]
pub trait FeedLoader: Send + Sync {
    async fn load_url(&self, url: &str, credentials: Option<&str>) -> AppResult<String>;
}

pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            client: HttpConfig::feed_fetch().build_client()?,
        })
    }
}

#[async_trait]
impl FeedLoader for FeedFetcher {
    async fn load_url(&self, url: &str, credentials: Option<&str>) -> AppResult<String> {
        let mut request = self.client.get(url);
        if let Some(credentials) = credentials {
            request = match credentials.split_once(':') {
                Some((user, password)) => request.basic_auth(user, Some(password)),
                None => request.basic_auth(credentials, None::<&str>),
            };
        }

        let response = request.send().await?.error_for_status()?;
        let body = response.text().await?;
        debug!("[Notify] Fetched {} bytes from feed", body.len());
        Ok(body)
    }
}

/// Turns the events of one or more iCalendar feeds into notification entries.
pub struct IcsPullSource {
    loader: Arc<dyn FeedLoader>,
    anchor: ZoneAnchor,
}

impl IcsPullSource {
    pub fn new(loader: Arc<dyn FeedLoader>, anchor: ZoneAnchor) -> Self {
        Self { loader, anchor }
    }

    fn entry_for(event: &CalendarEvent, fallback_link: &str) -> NotificationEntry {
        let mut text = event
            .start_timestamp
            .and_then(to_ical_date)
            .unwrap_or_default();
        if !event.location.is_empty() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&event.location);
        }

        let data = if event.location.starts_with("http:") || event.location.starts_with("https:") {
            event.location.clone()
        } else {
            fallback_link.to_string()
        };

        NotificationEntry::new(event.title.clone(), text, data)
    }
}

#[async_trait]
impl PullSource for IcsPullSource {
    async fn make_requests(&self, params: &WorkParams) -> AppResult<Option<Vec<String>>> {
        let urls: Vec<&str> = params
            .get_string(URLS_PARAMETER_KEY)
            .map(|urls| urls.split_whitespace().collect())
            .unwrap_or_default();
        if urls.is_empty() {
            return Ok(None);
        }

        let credentials = params.get_string(CREDENTIALS_PARAMETER_KEY);
        let mut contents = Vec::with_capacity(urls.len());
        for url in urls {
            let content = self
                .loader
                .load_url(url, credentials)
                .await
                .map_err(|e| AppError::notification(format!("Feed {} failed: {}", url, e.to_safe_string())))?;
            contents.push(content);
        }

        info!("[Notify] Loaded {} calendar feeds", contents.len());
        Ok(Some(contents))
    }

    fn parse_content(&self, content: &str, params: &WorkParams) -> Vec<NotificationEntry> {
        let link = params.get_string(LINK_PARAMETER_KEY).unwrap_or("");
        parse_calendar_events(content, self.anchor)
            .iter()
            .map(|event| Self::entry_for(event, link))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::UTC;
    use std::sync::Mutex;

    struct StaticFeeds {
        seen: Mutex<Vec<(String, Option<String>)>>,
    }

    #[async_trait]
    impl FeedLoader for StaticFeeds {
        async fn load_url(&self, url: &str, credentials: Option<&str>) -> AppResult<String> {
            self.seen
                .lock()
                .unwrap()
                .push((url.to_string(), credentials.map(str::to_string)));
            if url.contains("broken") {
                return Err(AppError::not_found("404"));
            }
            Ok(format!("BEGIN:VEVENT\nSUMMARY:{}\nEND:VEVENT\n", url))
        }
    }

    fn source() -> (IcsPullSource, Arc<StaticFeeds>) {
        let feeds = Arc::new(StaticFeeds {
            seen: Mutex::new(Vec::new()),
        });
        (IcsPullSource::new(feeds.clone(), ZoneAnchor::Named(UTC)), feeds)
    }

    #[tokio::test]
    async fn test_loads_every_url_with_credentials() {
        let (source, feeds) = source();
        let params = WorkParams::new()
            .with(URLS_PARAMETER_KEY, "https://a.example.com/1.ics https://b.example.com/2.ics")
            .with(CREDENTIALS_PARAMETER_KEY, "parent:secret");

        let contents = source.make_requests(&params).await.unwrap().unwrap();
        assert_eq!(contents.len(), 2);
        let seen = feeds.seen.lock().unwrap();
        assert_eq!(seen[1].0, "https://b.example.com/2.ics");
        assert_eq!(seen[1].1.as_deref(), Some("parent:secret"));
    }

    #[tokio::test]
    async fn test_no_urls_means_no_content() {
        let (source, _) = source();
        assert!(source.make_requests(&WorkParams::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_feed_fails_requests() {
        let (source, _) = source();
        let params = WorkParams::new().with(URLS_PARAMETER_KEY, "https://broken.example.com");
        assert!(source.make_requests(&params).await.is_err());
    }

    #[test]
    fn test_events_become_entries() {
        let (source, _) = source();
        let content = "BEGIN:VEVENT\nSUMMARY:Concert\n\
            DTSTART;TZID=UTC:20240601T190000Z\nLOCATION:https://tickets.example.com/9\nEND:VEVENT\n\
            BEGIN:VEVENT\nSUMMARY:Cleanup\nLOCATION:Yard\nEND:VEVENT\n";
        let params = WorkParams::new().with(LINK_PARAMETER_KEY, "intent:app.Calendar");

        let entries = source.parse_content(content, &params);
        assert_eq!(
            entries,
            vec![
                NotificationEntry::new(
                    "Concert",
                    "20240601T190000Z https://tickets.example.com/9",
                    "https://tickets.example.com/9"
                ),
                NotificationEntry::new("Cleanup", "Yard", "intent:app.Calendar"),
            ]
        );
    }

    #[test]
    fn test_fetcher_builds() {
        assert!(FeedFetcher::new().is_ok());
    }
}
