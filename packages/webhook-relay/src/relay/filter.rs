//! Path and committer-identity filters.

use crate::config::RelayConfig;
use crate::provider::ProviderKind;

/// Empty `allowed` permits every path. Otherwise the path, with one
/// trailing slash stripped, must start with some allowed path (also
/// stripped). Surrounding whitespace is ignored on both sides.
pub fn is_path_allowed(allowed: &[String], path: &str) -> bool {
    if allowed.is_empty() {
        return true;
    }

    let incoming = strip_trailing_slash(path.trim());
    allowed
        .iter()
        .map(|p| strip_trailing_slash(p.trim()))
        .any(|p| incoming.starts_with(p))
}

fn strip_trailing_slash(s: &str) -> &str {
    s.strip_suffix('/').unwrap_or(s)
}

/// Listed in `ignored_users`, or an unknown committer on GitHub.
pub fn is_ignored_user(config: &RelayConfig, kind: ProviderKind, committer: &str) -> bool {
    if config.ignored_users.contains(committer) {
        return true;
    }
    // GitLab has no equivalent default.
    committer.is_empty() && kind == ProviderKind::GitHub
}

/// Empty `allowed_users` permits everyone.
pub fn is_allowed_user(config: &RelayConfig, committer: &str) -> bool {
    config.allowed_users.is_empty() || config.allowed_users.contains(committer)
}
