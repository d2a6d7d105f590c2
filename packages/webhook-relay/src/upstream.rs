//! Outbound HTTP transport to upstream receivers.

use crate::hook::Delivery;
use crate::{Error, Result};
use std::time::Duration;
use tracing::info;

/// Shared HTTP client for upstream sends. Built once, owned by the relay.
///
/// Upstream TLS certificates are NOT verified: the relay is meant to sit
/// inside a trusted network boundary next to its receivers.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client build failed: {e}")))?;

        info!(timeout_secs = timeout.as_secs(), "Upstream client initialized");
        Ok(Self { http })
    }

    /// Replay `delivery` to `url` with its method, headers and exact payload.
    pub async fn send(&self, url: &str, delivery: &Delivery) -> Result<reqwest::Response> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| Error::UpstreamTransport(format!("invalid upstream URL '{url}': {e}")))?;

        self.http
            .request(delivery.method().clone(), url)
            .headers(delivery.headers().clone())
            .body(delivery.payload().clone())
            .send()
            .await
            .map_err(|e| Error::UpstreamTransport(e.to_string()))
    }
}

/// `<base><path>[?<query>]`; a base without a scheme is sent over plain HTTP.
pub fn target_url(base: &str, path: &str, query: Option<&str>) -> String {
    let base = base.trim();
    let mut url = if base.contains("://") {
        format!("{base}{path}")
    } else {
        format!("http://{base}{path}")
    };
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    url
}
