//! GitHub: HMAC-signed deliveries.

use super::constant_time_eq;
use crate::hook::Delivery;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha1::Sha1;
use sha2::Sha256;
use tracing::debug;

pub const SIGNATURE_256_HEADER: &str = "x-hub-signature-256";
pub const SIGNATURE_HEADER: &str = "x-hub-signature";
pub const EVENT_HEADER: &str = "x-github-event";
pub const PUSH_EVENT: &str = "push";

pub(super) const REQUIRED_HEADERS: &[&[&str]] =
    &[&[SIGNATURE_256_HEADER, SIGNATURE_HEADER], &[EVENT_HEADER]];

/// SHA-256 is used when its header is present, SHA-1 otherwise.
pub(super) fn validate(secret: &str, delivery: &Delivery) -> bool {
    let payload = delivery.payload();
    let (expected, provided) = if let Some(provided) = delivery.header(SIGNATURE_256_HEADER) {
        (sign::<Hmac<Sha256>>("sha256", secret, payload), provided)
    } else if let Some(provided) = delivery.header(SIGNATURE_HEADER) {
        (sign::<Hmac<Sha1>>("sha1", secret, payload), provided)
    } else {
        debug!("GitHub delivery carries no signature header");
        return false;
    };

    match expected {
        Some(expected) => constant_time_eq(expected.as_bytes(), provided.as_bytes()),
        None => false,
    }
}

/// `<tag>=<hex hmac>` over the raw payload bytes.
fn sign<M: Mac>(tag: &str, secret: &str, payload: &[u8]) -> Option<String>
where
    M: hmac::digest::KeyInit,
{
    let mut mac = <M as Mac>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload);
    Some(format!("{tag}={}", hex::encode(mac.finalize().into_bytes())))
}

pub(super) fn is_committer_check_event(event: &str) -> bool {
    event == PUSH_EVENT
}

#[derive(Deserialize)]
struct PushPayload {
    #[serde(default)]
    head_commit: Option<HeadCommit>,
}

#[derive(Deserialize)]
struct HeadCommit {
    #[serde(default)]
    committer: Option<Identity>,
}

#[derive(Deserialize)]
struct Identity {
    #[serde(default)]
    username: Option<String>,
}

pub(super) fn committer(payload: &[u8], event: &str) -> String {
    if event != PUSH_EVENT {
        return String::new();
    }
    match serde_json::from_slice::<PushPayload>(payload) {
        Ok(push) => push
            .head_commit
            .and_then(|c| c.committer)
            .and_then(|i| i.username)
            .unwrap_or_default(),
        Err(e) => {
            debug!(error = %e, "GitHub push payload is not parseable");
            String::new()
        }
    }
}
