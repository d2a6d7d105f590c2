//! Git hosting providers: delivery authentication and metadata extraction.
//!
//! A [`Provider`] is a stateless strategy selected per request from the
//! configured kind. Adding a vendor means adding a variant plus one arm in
//! each capability below.

mod github;
mod gitlab;

use crate::hook::Delivery;
use crate::Error;
use std::fmt;
use std::str::FromStr;
use subtle::ConstantTimeEq;

pub use github::{
    EVENT_HEADER as GITHUB_EVENT_HEADER, PUSH_EVENT as GITHUB_PUSH_EVENT,
    SIGNATURE_256_HEADER as GITHUB_SIGNATURE_256_HEADER,
    SIGNATURE_HEADER as GITHUB_SIGNATURE_HEADER,
};
pub use gitlab::{
    EVENT_HEADER as GITLAB_EVENT_HEADER, PUSH_EVENT as GITLAB_PUSH_EVENT,
    TAG_PUSH_EVENT as GITLAB_TAG_PUSH_EVENT, TOKEN_HEADER as GITLAB_TOKEN_HEADER,
};

/// Supported provider kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    GitHub,
    GitLab,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::GitHub => "github",
            ProviderKind::GitLab => "gitlab",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "github" => Ok(ProviderKind::GitHub),
            "gitlab" => Ok(ProviderKind::GitLab),
            other => Err(Error::Config(format!("unknown provider kind '{other}'"))),
        }
    }
}

/// Vendor-specific authentication and metadata strategy.
#[derive(Debug, Clone)]
pub enum Provider {
    GitHub { secret: String },
    GitLab { secret: String },
}

impl Provider {
    /// Build a provider for `kind`. Unknown kinds are a configuration error.
    pub fn new(kind: &str, secret: &str) -> Result<Self, Error> {
        let secret = secret.to_string();
        Ok(match kind.parse::<ProviderKind>()? {
            ProviderKind::GitHub => Provider::GitHub { secret },
            ProviderKind::GitLab => Provider::GitLab { secret },
        })
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Provider::GitHub { .. } => ProviderKind::GitHub,
            Provider::GitLab { .. } => ProviderKind::GitLab,
        }
    }

    /// Headers a delivery must carry. Each group is satisfied by any one of
    /// its names; every present name of a group is copied into the delivery.
    pub fn required_headers(&self) -> &'static [&'static [&'static str]] {
        match self {
            Provider::GitHub { .. } => github::REQUIRED_HEADERS,
            Provider::GitLab { .. } => gitlab::REQUIRED_HEADERS,
        }
    }

    /// Check the delivery's signature (GitHub) or token (GitLab) against the
    /// configured secret. Any missing header or mismatch yields `false`.
    pub fn validate(&self, delivery: &Delivery) -> bool {
        match self {
            Provider::GitHub { secret } => github::validate(secret, delivery),
            Provider::GitLab { secret } => gitlab::validate(secret, delivery),
        }
    }

    /// The event-type header verbatim, or `""` if absent.
    pub fn event_type<'a>(&self, delivery: &'a Delivery) -> &'a str {
        let header = match self {
            Provider::GitHub { .. } => github::EVENT_HEADER,
            Provider::GitLab { .. } => gitlab::EVENT_HEADER,
        };
        delivery.header(header).unwrap_or_default()
    }

    /// Whether `event` carries an identifiable committer.
    pub fn is_committer_check_event(&self, event: &str) -> bool {
        match self {
            Provider::GitHub { .. } => github::is_committer_check_event(event),
            Provider::GitLab { .. } => gitlab::is_committer_check_event(event),
        }
    }

    /// Committer identifier from the payload, or `""` when unknown.
    pub fn committer(&self, delivery: &Delivery, event: &str) -> String {
        match self {
            Provider::GitHub { .. } => github::committer(delivery.payload(), event),
            Provider::GitLab { .. } => gitlab::committer(delivery.payload(), event),
        }
    }
}

/// Constant-time byte comparison; length mismatch returns early.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
