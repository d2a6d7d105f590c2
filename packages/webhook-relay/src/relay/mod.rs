//! Relay engine: filter, authenticate, broadcast, elect.
//!
//! Each inbound request walks these stages and stops at the first that
//! rejects it:
//!
//! 1. path filter (403)
//! 2. provider construction (500)
//! 3. normalization into a [`Delivery`] (400)
//! 4. committer filter, only when user lists are configured (200, dropped)
//! 5. signature validation, only when a secret is configured (400)
//! 6. sequential broadcast to every upstream, unconditionally
//! 7. election of the first sub-400 response (500 if none)

mod election;
mod filter;

pub use election::elect;
pub use filter::{is_allowed_user, is_ignored_user, is_path_allowed};

use crate::config::RelayConfig;
use crate::hook::{self, Delivery};
use crate::metrics::METRICS;
use crate::middleware::RequestId;
use crate::provider::Provider;
use crate::upstream::{target_url, UpstreamClient};
use crate::{Error, Result};
use axum::body::Body;
use axum::extract::Request;
use axum::http::header::{CONNECTION, TRANSFER_ENCODING};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{error, info, warn};

/// The validation-and-fan-out relay. Immutable after construction; safe to
/// share across concurrent requests.
#[derive(Debug)]
pub struct Relay {
    config: RelayConfig,
    client: UpstreamClient,
    body_limit: usize,
}

impl Relay {
    pub fn new(config: RelayConfig, client: UpstreamClient, body_limit: usize) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            client,
            body_limit,
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Relay one inbound request and produce the client response.
    pub async fn handle(&self, request: Request) -> Response {
        let start = Instant::now();
        METRICS.deliveries_total.fetch_add(1, Ordering::Relaxed);

        let response = match self.relay(request).await {
            Ok(response) => response,
            Err(e) => {
                let counter = match &e {
                    Error::PathRejected(_) => Some(&METRICS.rejected_path),
                    Error::MalformedDelivery(_) => Some(&METRICS.rejected_malformed),
                    Error::Authentication => Some(&METRICS.rejected_auth),
                    Error::AllUpstreamsFailed => Some(&METRICS.all_upstreams_failed),
                    _ => None,
                };
                if let Some(counter) = counter {
                    counter.fetch_add(1, Ordering::Relaxed);
                }
                e.into_response()
            }
        };

        METRICS.record_relay_duration(start);
        response
    }

    async fn relay(&self, request: Request) -> Result<Response> {
        let req_id = request
            .extensions()
            .get::<RequestId>()
            .map(|r| r.0.clone())
            .unwrap_or_default();
        let path = request.uri().path().to_string();
        let query = request.uri().query().map(str::to_string);

        if !is_path_allowed(&self.config.allowed_paths, &path) {
            warn!(req_id = %req_id, path = %path, "Not allowed to proxy path");
            return Err(Error::PathRejected(path));
        }

        let provider = Provider::new(&self.config.provider, &self.config.secret).map_err(|e| {
            error!(req_id = %req_id, error = %e, "Error creating provider");
            e
        })?;

        let delivery = hook::parse(request, &provider, self.body_limit)
            .await
            .map_err(|e| {
                warn!(req_id = %req_id, error = %e, "Error parsing hook");
                e
            })?;

        if let Some(committer) = self.dropped_committer(&provider, &delivery) {
            info!(req_id = %req_id, committer = %committer, "Ignoring request for user");
            METRICS.deliveries_dropped.fetch_add(1, Ordering::Relaxed);
            return Ok((
                StatusCode::OK,
                format!("Ignoring request for user: {committer}"),
            )
                .into_response());
        }

        if self.config.has_secret() && !provider.validate(&delivery) {
            warn!(req_id = %req_id, provider = %provider.kind(), "Error validating hook");
            return Err(Error::Authentication);
        }

        METRICS.deliveries_forwarded.fetch_add(1, Ordering::Relaxed);
        let outcomes = self
            .broadcast(&delivery, &path, query.as_deref(), &req_id)
            .await;

        let labelled = self
            .config
            .upstreams
            .iter()
            .map(String::as_str)
            .zip(outcomes)
            .collect();

        match elect(labelled, |r: &reqwest::Response| r.status()) {
            Some((index, winner)) => {
                info!(
                    req_id = %req_id,
                    upstream = %self.config.upstreams[index],
                    status = %winner.status(),
                    "Relayed delivery"
                );
                into_client_response(winner).await
            }
            None => {
                error!(req_id = %req_id, "All upstream requests failed");
                Err(Error::AllUpstreamsFailed)
            }
        }
    }

    /// `Some(committer)` when the committer filter drops this delivery.
    fn dropped_committer(&self, provider: &Provider, delivery: &Delivery) -> Option<String> {
        if !self.config.filters_users() {
            return None;
        }

        let event = provider.event_type(delivery);
        if !provider.is_committer_check_event(event) {
            return None;
        }

        let committer = provider.committer(delivery, event);
        info!(committer = %committer, event, "Incoming request from user");

        let dropped = is_ignored_user(&self.config, provider.kind(), &committer)
            || !is_allowed_user(&self.config, &committer);
        dropped.then_some(committer)
    }

    /// Send to every upstream in order, regardless of earlier outcomes.
    async fn broadcast(
        &self,
        delivery: &Delivery,
        path: &str,
        query: Option<&str>,
        req_id: &str,
    ) -> Vec<Result<reqwest::Response>> {
        let mut outcomes = Vec::with_capacity(self.config.upstreams.len());

        for upstream in &self.config.upstreams {
            let url = target_url(upstream, path, query);
            info!(req_id = %req_id, upstream = %url, "Proxying request to upstream");
            METRICS.upstream_requests.fetch_add(1, Ordering::Relaxed);

            let outcome = self.client.send(&url, delivery).await;
            if let Err(ref e) = outcome {
                METRICS.upstream_errors.fetch_add(1, Ordering::Relaxed);
                error!(req_id = %req_id, upstream = %url, error = %e, "Error redirecting to upstream");
            }
            outcomes.push(outcome);
        }

        outcomes
    }
}

/// Copy the elected response's headers, body and status onto ours.
async fn into_client_response(upstream: reqwest::Response) -> Result<Response> {
    let status = upstream.status();
    let headers = upstream.headers().clone();
    let body = upstream.bytes().await.map_err(|e| {
        error!(error = %e, "Error reading response body from elected upstream");
        Error::UpstreamBody(e.to_string())
    })?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    for (name, value) in &headers {
        // Framing belongs to each hop; the body is re-sent in full.
        if name == TRANSFER_ENCODING || name == CONNECTION {
            continue;
        }
        response.headers_mut().append(name, value.clone());
    }
    Ok(response)
}
