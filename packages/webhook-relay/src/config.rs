//! Relay configuration.
//!
//! [`Config`] is what the binary deserializes from `relay.toml` and `RELAY_*`
//! environment variables. [`RelayConfig`] is the validated, read-only view
//! the relay engine runs on.

use crate::provider::ProviderKind;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

/// Raw service configuration. List-valued fields are comma-separated.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "defaults::bind_address")]
    pub bind_address: String,

    #[serde(default = "defaults::provider")]
    pub provider: String,

    /// Primary upstream; relayed to first.
    #[serde(default)]
    pub upstream_url: String,

    #[serde(default)]
    pub upstream_urls: String,

    /// Empty disables signature validation.
    #[serde(default)]
    pub secret: String,

    #[serde(default)]
    pub allowed_paths: String,

    #[serde(default)]
    pub ignored_users: String,

    #[serde(default)]
    pub allowed_users: String,

    #[serde(default = "defaults::upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,

    #[serde(default = "defaults::max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: defaults::bind_address(),
            provider: defaults::provider(),
            upstream_url: String::new(),
            upstream_urls: String::new(),
            secret: String::new(),
            allowed_paths: String::new(),
            ignored_users: String::new(),
            allowed_users: String::new(),
            upstream_timeout_secs: defaults::upstream_timeout_secs(),
            max_body_bytes: defaults::max_body_bytes(),
        }
    }
}

mod defaults {
    pub fn bind_address() -> String {
        "0.0.0.0:8080".into()
    }

    pub fn provider() -> String {
        "github".into()
    }

    pub fn upstream_timeout_secs() -> u64 {
        30
    }

    /// GitHub caps webhook payloads at 25 MiB.
    pub fn max_body_bytes() -> usize {
        25 * 1024 * 1024
    }
}

impl Config {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// Validate and consolidate into a [`RelayConfig`].
    pub fn relay_config(&self) -> Result<RelayConfig> {
        let primary = self.upstream_url.trim();
        let extra = split_list(&self.upstream_urls);

        if primary.is_empty() && extra.is_empty() {
            return Err(Error::Config(
                "'upstream_url' or 'upstream_urls' must be specified".into(),
            ));
        }

        let mut upstreams: Vec<String> = Vec::new();
        for url in std::iter::once(primary.to_string())
            .filter(|u| !u.is_empty())
            .chain(extra)
        {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::Config(format!(
                    "invalid upstream URL '{url}': must start with http:// or https://"
                )));
            }
            if !upstreams.contains(&url) {
                upstreams.push(url);
            }
        }

        RelayConfig::new(
            &self.provider,
            upstreams,
            split_list(&self.allowed_paths),
            self.secret.clone(),
            split_list(&self.ignored_users).into_iter().collect(),
            split_list(&self.allowed_users).into_iter().collect(),
        )
    }
}

/// Split a comma-separated list, trimming entries and dropping blanks.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validated relay settings, read-only for the process lifetime.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Lower-cased provider kind name.
    pub provider: String,
    /// Ordered by tie-break priority; never empty.
    pub upstreams: Vec<String>,
    /// Path prefixes; empty allows everything.
    pub allowed_paths: Vec<String>,
    pub secret: String,
    pub ignored_users: HashSet<String>,
    pub allowed_users: HashSet<String>,
}

impl RelayConfig {
    pub fn new(
        provider: &str,
        upstreams: Vec<String>,
        allowed_paths: Vec<String>,
        secret: String,
        ignored_users: HashSet<String>,
        allowed_users: HashSet<String>,
    ) -> Result<Self> {
        let provider = provider.trim().to_ascii_lowercase();
        if provider.is_empty() {
            return Err(Error::Config("cannot create relay with empty provider".into()));
        }
        provider.parse::<ProviderKind>()?;

        let config = Self {
            provider,
            upstreams,
            allowed_paths,
            secret,
            ignored_users,
            allowed_users,
        };
        config.validate()?;
        Ok(config)
    }

    /// Structural invariants the relay engine depends on.
    pub fn validate(&self) -> Result<()> {
        if self.upstreams.is_empty() {
            return Err(Error::Config("cannot create relay with no upstreams".into()));
        }
        if self.upstreams.iter().any(|u| u.trim().is_empty()) {
            return Err(Error::Config(
                "cannot create relay with an empty URL in upstreams".into(),
            ));
        }
        Ok(())
    }

    pub fn has_secret(&self) -> bool {
        !self.secret.trim().is_empty()
    }

    pub fn filters_users(&self) -> bool {
        !self.ignored_users.is_empty() || !self.allowed_users.is_empty()
    }
}
