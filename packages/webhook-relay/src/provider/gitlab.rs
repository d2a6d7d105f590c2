//! GitLab: shared-token deliveries.

use super::constant_time_eq;
use crate::hook::Delivery;
use serde::Deserialize;
use tracing::debug;

pub const TOKEN_HEADER: &str = "x-gitlab-token";
pub const EVENT_HEADER: &str = "x-gitlab-event";
pub const PUSH_EVENT: &str = "Push Hook";
pub const TAG_PUSH_EVENT: &str = "Tag Push Hook";

pub(super) const REQUIRED_HEADERS: &[&[&str]] = &[&[TOKEN_HEADER], &[EVENT_HEADER]];

/// Direct comparison of the token header with the secret, no hashing.
pub(super) fn validate(secret: &str, delivery: &Delivery) -> bool {
    match delivery.header(TOKEN_HEADER) {
        Some(token) => constant_time_eq(secret.as_bytes(), token.as_bytes()),
        None => {
            debug!("GitLab delivery carries no token header");
            false
        }
    }
}

pub(super) fn is_committer_check_event(event: &str) -> bool {
    event == PUSH_EVENT || event == TAG_PUSH_EVENT
}

#[derive(Deserialize)]
struct PushPayload {
    #[serde(default)]
    user_username: Option<String>,
}

pub(super) fn committer(payload: &[u8], event: &str) -> String {
    if !is_committer_check_event(event) {
        return String::new();
    }
    match serde_json::from_slice::<PushPayload>(payload) {
        Ok(push) => push.user_username.unwrap_or_default(),
        Err(e) => {
            debug!(error = %e, "GitLab push payload is not parseable");
            String::new()
        }
    }
}
