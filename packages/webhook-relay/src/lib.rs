//! # Webhook Relay
//!
//! Receives GitHub or GitLab webhook deliveries, authenticates them against a
//! shared secret, filters by path and committer, and re-sends each accepted
//! delivery to every configured upstream. The first upstream answering below
//! 400 has its response returned to the sender.
//!
//! ## Quick Start
//! ```bash
//! RELAY_UPSTREAM_URL=https://ci.internal RELAY_SECRET=s3cret cargo run --bin webhook-relay
//! ```
//!
//! ## Endpoints
//! - `GET /health` - Liveness probe
//! - `GET /metrics` - Prometheus counters
//! - `POST /{*path}` - Relay a webhook delivery

pub mod config;
mod error;
mod handlers;
pub mod hook;
pub mod metrics;
pub mod middleware;
pub mod provider;
pub mod relay;
mod router;
mod state;
pub mod upstream;

pub use config::{Config, RelayConfig};
pub use error::{Error, Result};
pub use handlers::HEALTH_BODY;
pub use hook::Delivery;
pub use provider::{Provider, ProviderKind};
pub use relay::Relay;
pub use router::create as create_router;
pub use state::AppState;
pub use upstream::UpstreamClient;
