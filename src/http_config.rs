//! HTTP client configuration module
//!
//! Centralized timeouts and connection settings for the two outbound paths:
//! proxied web-content requests and background feed pulls. Neither path
//! retries; a timed out call is reported to the caller once.

use crate::error::AppResult;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

const USER_AGENT: &str = concat!("webshell-bridge/", env!("CARGO_PKG_VERSION"));

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Read timeout
    pub read_timeout: Duration,
    /// Idle pooled connections per host
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 2,
        }
    }
}

impl HttpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config for requests proxied on behalf of web content
    pub fn upstream_proxy(read_timeout: Duration) -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            read_timeout,
            pool_max_idle_per_host: 8, // pages fan out many parallel loads
        }
    }

    /// Config for pull-notification feed fetching
    pub fn feed_fetch() -> Self {
        Self {
            connect_timeout: Duration::from_secs(20),
            read_timeout: Duration::from_secs(120), // ICS files can be large
            pool_max_idle_per_host: 2,
        }
    }

    /// Build a reqwest client with this configuration
    pub fn build_client(&self) -> AppResult<Client> {
        Ok(ClientBuilder::new()
            .user_agent(USER_AGENT)
            .connect_timeout(self.connect_timeout)
            .timeout(self.read_timeout) // unified timeout, reqwest 0.11 has no separate read timeout
            .tcp_keepalive(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_proxy_uses_given_timeout() {
        let config = HttpConfig::upstream_proxy(Duration::from_secs(60));
        assert_eq!(config.read_timeout, Duration::from_secs(60));
        assert!(config.build_client().is_ok());
    }

    #[test]
    fn test_feed_fetch_allows_large_bodies() {
        let config = HttpConfig::feed_fetch();
        assert!(config.read_timeout > HttpConfig::default().read_timeout);
    }
}
