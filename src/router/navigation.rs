//! Navigation handling for the primary surface and for new windows.

use crate::error::AppResult;
use log::{info, warn};
use std::sync::Arc;
use url::Url;

const WEB_SCHEMES: [&str; 2] = ["http", "https"];

/// System capability that opens a URI in its associated handler
/// (browser, maps, dialer, ...).
#[cfg_attr(test, mockall::automock)]
pub trait UrlOpener: Send + Sync {
    fn open(&self, uri: &str) -> AppResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    /// The surface must not navigate
    Suppress,
    /// The URI went to the system handler; the surface must not navigate
    HandedOff(String),
}

pub fn is_web_scheme(uri: &str) -> bool {
    match Url::parse(uri) {
        Ok(url) => WEB_SCHEMES.contains(&url.scheme()),
        Err(_) => false,
    }
}

/// Top-level navigation in the primary surface. The embedded application
/// routes internally, so web URLs never replace the page; other schemes go to
/// the system handler.
pub fn route_navigation(opener: &dyn UrlOpener, uri: &str) -> NavigationDecision {
    if is_web_scheme(uri) {
        return NavigationDecision::Suppress;
    }
    hand_off(opener, uri)
}

fn hand_off(opener: &dyn UrlOpener, uri: &str) -> NavigationDecision {
    match opener.open(uri) {
        Ok(()) => {
            info!("[Router] Handed {} to the system handler", uri);
            NavigationDecision::HandedOff(uri.to_string())
        }
        Err(e) => {
            warn!("[Router] No handler accepted {}: {}", uri, e.to_safe_string());
            NavigationDecision::Suppress
        }
    }
}

/// Stand-in for the throwaway secondary surface created when web content
/// asks for a new browsing context (`target="_blank"`, `window.open`). The
/// platform only reveals the destination once the secondary surface starts
/// navigating, so the first URL it reports is captured and opened externally.
pub struct NewWindowCapture {
    opener: Arc<dyn UrlOpener>,
    captured: Option<String>,
}

impl NewWindowCapture {
    pub fn new(opener: Arc<dyn UrlOpener>) -> Self {
        Self {
            opener,
            captured: None,
        }
    }

    pub fn on_navigation(&mut self, uri: &str) -> NavigationDecision {
        if self.captured.is_some() {
            return NavigationDecision::Suppress;
        }
        self.captured = Some(uri.to_string());
        hand_off(self.opener.as_ref(), uri)
    }

    pub fn captured_url(&self) -> Option<&str> {
        self.captured.as_deref()
    }
}
