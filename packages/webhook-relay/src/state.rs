//! Application state shared across handlers.

use crate::relay::Relay;
use std::time::Instant;
use tracing::info;

/// Shared application state.
pub struct AppState {
    pub relay: Relay,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(relay: Relay) -> Self {
        let config = relay.config();
        info!(
            provider = %config.provider,
            upstreams = config.upstreams.len(),
            allowed_paths = config.allowed_paths.len(),
            validating = config.has_secret(),
            "Relay state ready"
        );

        Self {
            relay,
            start_time: Instant::now(),
        }
    }
}
