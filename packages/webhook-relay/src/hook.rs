//! Canonical, provider-agnostic webhook delivery.

use crate::provider::Provider;
use crate::{Error, Result};
use axum::body::{to_bytes, Body, Bytes};
use axum::extract::Request;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};

/// One inbound webhook call, reduced to what the active provider needs.
/// Immutable once built; shared read-only by every upstream send.
#[derive(Debug, Clone)]
pub struct Delivery {
    headers: HeaderMap,
    payload: Bytes,
    method: Method,
}

impl Delivery {
    pub fn new(method: Method, headers: HeaderMap, payload: impl Into<Bytes>) -> Self {
        Self {
            headers,
            payload: payload.into(),
            method,
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as text. Empty or non-UTF-8 values count as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        non_empty(&self.headers, name).and_then(|v| v.to_str().ok())
    }

    /// Exact inbound body bytes.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn method(&self) -> &Method {
        &self.method
    }
}

fn non_empty<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a HeaderValue> {
    headers.get(name).filter(|v| !v.is_empty())
}

/// Build a [`Delivery`] from an inbound request.
///
/// Copies only the provider's required headers (plus `Content-Type` when
/// present) and reads the body fully, up to `body_limit` bytes. A missing
/// required header or an unreadable body is a `MalformedDelivery`.
pub async fn parse(request: Request, provider: &Provider, body_limit: usize) -> Result<Delivery> {
    let (parts, body) = request.into_parts();
    let headers = copy_headers(&parts.headers, provider)?;
    let payload = read_body(body, body_limit).await?;
    Ok(Delivery::new(parts.method, headers, payload))
}

fn copy_headers(inbound: &HeaderMap, provider: &Provider) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    for group in provider.required_headers() {
        let mut found = false;
        for name in group.iter().copied() {
            if let Some(value) = non_empty(inbound, name) {
                headers.insert(HeaderName::from_static(name), value.clone());
                found = true;
            }
        }
        if !found {
            return Err(Error::MalformedDelivery(format!(
                "Required header '{}' not found in Request",
                group.join("' or '")
            )));
        }
    }

    if let Some(value) = non_empty(inbound, CONTENT_TYPE.as_str()) {
        headers.insert(CONTENT_TYPE, value.clone());
    }

    Ok(headers)
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes> {
    to_bytes(body, limit)
        .await
        .map_err(|e| Error::MalformedDelivery(format!("failed to read request body: {e}")))
}
