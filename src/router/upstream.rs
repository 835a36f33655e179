//! Upstream HTTP collaborator used for cross-origin requests.

use crate::error::AppResult;
use crate::http_config::HttpConfig;
use crate::models::HttpMethod;
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Lower-cased names, no duplicates
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub reason: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            reason: "OK".to_string(),
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// A single attempt; errors mean no response could be obtained at all.
    async fn execute(&self, request: UpstreamRequest) -> AppResult<UpstreamResponse>;
}

pub struct ReqwestUpstream {
    client: Client,
}

impl ReqwestUpstream {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: HttpConfig::upstream_proxy(timeout).build_client()?,
        })
    }
}

#[async_trait]
impl UpstreamClient for ReqwestUpstream {
    async fn execute(&self, request: UpstreamRequest) -> AppResult<UpstreamResponse> {
        let mut builder = self.client.request(request.method.to_reqwest(), &request.url);

        for (name, value) in &request.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => builder = builder.header(name, value),
                _ => debug!("[Router] Dropping unrepresentable header '{}'", name),
            }
        }

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(UpstreamResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
        })
    }
}
