//! CORS headers attached to every proxied response.
//!
//! The allowed origin is the bridge's own synthetic origin rather than `*`:
//! fetches made with `credentials: "include"` (needed to pass login cookies
//! through) are rejected by the web view when the origin is a wildcard.

use log::warn;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_CREDENTIALS,
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN,
};

pub const DEFAULT_ALLOW_HEADERS: &str = "Content-Type, Authorization";

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allow_origin: HeaderValue,
    allow_credentials: HeaderValue,
    allow_headers: HeaderValue,
}

impl CorsPolicy {
    /// `origin` must be a serialized origin such as `https://host`; an invalid
    /// header value falls back to the literal `null` origin.
    pub fn for_origin(origin: &str) -> Self {
        let allow_origin = HeaderValue::from_str(origin).unwrap_or_else(|_| {
            warn!("[Router] Origin '{}' is not a valid header value", origin);
            HeaderValue::from_static("null")
        });
        Self {
            allow_origin,
            allow_credentials: HeaderValue::from_static("true"),
            allow_headers: HeaderValue::from_static(DEFAULT_ALLOW_HEADERS),
        }
    }

    pub fn allow_origin(&self) -> &HeaderValue {
        &self.allow_origin
    }

    pub fn headers(&self) -> [(HeaderName, HeaderValue); 3] {
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone()),
            (ACCESS_CONTROL_ALLOW_CREDENTIALS, self.allow_credentials.clone()),
            (ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone()),
        ]
    }

    /// Upstream headers outside the fixed set pass through untouched; the three
    /// CORS keys always carry the policy's values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in self.headers() {
            headers.insert(name, value);
        }
    }
}
