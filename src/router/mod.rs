// Request routing for the embedded web content.
// Same-origin loads are served from bundled assets, everything else is proxied
// upstream with CORS headers so the page can read the response.

use crate::config::BridgeConfig;
use crate::error::{AppError, AppResult};
use crate::models::{InterceptedRequest, ProxiedResponse, RouteOutcome};
use crate::utils::logging;
use log::{debug, warn};
use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

pub mod assets;
pub mod content_type;
pub mod cors;
pub mod navigation;
pub mod pending;
pub mod token;
pub mod upstream;

pub use assets::{Asset, AssetSource, DirectoryAssets};
pub use cors::CorsPolicy;
pub use navigation::{NavigationDecision, NewWindowCapture, UrlOpener};
pub use pending::PendingBodies;
pub use upstream::{ReqwestUpstream, UpstreamClient, UpstreamRequest, UpstreamResponse};

pub struct RequestRouter {
    origin: url::Origin,
    cors: CorsPolicy,
    assets: Arc<dyn AssetSource>,
    upstream: Arc<dyn UpstreamClient>,
    opener: Arc<dyn UrlOpener>,
    pending: Arc<PendingBodies>,
}

impl RequestRouter {
    /// Proxies through a reqwest client bounded by the configured upstream
    /// timeout.
    pub fn from_config(
        config: &BridgeConfig,
        assets: Arc<dyn AssetSource>,
        opener: Arc<dyn UrlOpener>,
    ) -> AppResult<Self> {
        let upstream = ReqwestUpstream::new(config.upstream_timeout())?;
        Self::new(config, assets, Arc::new(upstream), opener)
    }

    pub fn new(
        config: &BridgeConfig,
        assets: Arc<dyn AssetSource>,
        upstream: Arc<dyn UpstreamClient>,
        opener: Arc<dyn UrlOpener>,
    ) -> AppResult<Self> {
        config.validate()?;

        let origin = Url::parse(&config.synthetic_origin)
            .map_err(|e| AppError::config(format!("Invalid synthetic origin: {}", e)))?
            .origin();
        if !origin.is_tuple() {
            return Err(AppError::config(format!(
                "Synthetic origin '{}' has no host",
                config.synthetic_origin
            )));
        }

        Ok(Self {
            cors: CorsPolicy::for_origin(&origin.ascii_serialization()),
            origin,
            assets,
            upstream,
            opener,
            pending: Arc::new(PendingBodies::new(
                config.pending_body_capacity,
                config.pending_body_ttl(),
            )),
        })
    }

    /// Shared with the script-side capture hook.
    pub fn pending_bodies(&self) -> Arc<PendingBodies> {
        self.pending.clone()
    }

    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin
    }

    pub async fn intercept(&self, request: &InterceptedRequest) -> RouteOutcome {
        let tagged = token::split_request_token(&request.url);
        let url = match Url::parse(tagged.url) {
            Ok(url) => url,
            Err(e) => {
                debug!("[Router] Not handling unparseable URL {}: {}", tagged.url, e);
                return RouteOutcome::NotHandled;
            }
        };

        if self.is_same_origin(&url) {
            self.serve_asset(&url).await
        } else {
            let request_id = tagged.token.unwrap_or(&request.request_id);
            self.proxy(request, tagged.url, request_id, &url).await
        }
    }

    async fn serve_asset(&self, url: &Url) -> RouteOutcome {
        let path = url.path();
        match self.assets.resolve(path).await {
            Ok(Some(asset)) => RouteOutcome::Handled(ProxiedResponse {
                status: 200,
                reason: "OK".to_string(),
                content_type: content_type::resolve(path, asset.content_type.as_deref()),
                charset: content_type::DEFAULT_CHARSET.to_string(),
                headers: HeaderMap::new(),
                body: asset.body,
            }),
            Ok(None) => {
                debug!("[Router] No bundled asset for {}", path);
                RouteOutcome::NotHandled
            }
            Err(e) => {
                warn!("[Router] Asset lookup for {} failed: {}", path, e);
                RouteOutcome::NotHandled
            }
        }
    }

    async fn proxy(
        &self,
        request: &InterceptedRequest,
        target: &str,
        request_id: &str,
        url: &Url,
    ) -> RouteOutcome {
        let body = if request.method.carries_body() {
            self.pending.get(target, request_id)
        } else {
            None
        };

        let upstream_request = UpstreamRequest {
            method: request.method.clone(),
            url: target.to_string(),
            headers: fold_header_names(&request.headers),
            body,
        };

        let started = Instant::now();
        let response = match self.upstream.execute(upstream_request).await {
            Ok(response) => response,
            Err(e) => {
                logging::log_network_error(&format!("{} {}", request.method, target), &e);
                return RouteOutcome::NotHandled;
            }
        };
        logging::log_proxied_request(
            request.method.as_str(),
            target,
            response.status,
            started.elapsed().as_millis() as u64,
        );

        let mut headers = response.headers;
        self.cors.apply(&mut headers);

        RouteOutcome::Handled(ProxiedResponse {
            status: response.status,
            reason: response.reason,
            content_type: content_type::resolve(url.path(), None),
            charset: content_type::DEFAULT_CHARSET.to_string(),
            headers,
            body: response.body,
        })
    }

    pub fn route_navigation(&self, uri: &str) -> NavigationDecision {
        navigation::route_navigation(self.opener.as_ref(), uri)
    }

    pub fn new_window(&self) -> NewWindowCapture {
        NewWindowCapture::new(self.opener.clone())
    }
}

/// Lower-cases header names. Names that collide after folding keep the
/// position of their first occurrence and the value of their last.
pub fn fold_header_names(headers: &[(String, String)]) -> Vec<(String, String)> {
    let mut folded: Vec<(String, String)> = Vec::with_capacity(headers.len());
    for (name, value) in headers {
        let name = name.to_ascii_lowercase();
        match folded.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value.clone(),
            None => folded.push((name, value.clone())),
        }
    }
    folded
}
