//! Upstream resolution.
//!
//! # Responsibilities
//! - Map a normalized request path to an upstream target
//! - Detect the AI namespace by path prefix (boundary-aware)
//! - Join base URLs and sub-prefixes without double slashes
//!
//! # Design Decisions
//! - Pure function over precomputed state; safe for arbitrary input
//! - Namespace is decided once per request and never renegotiated
//! - Unknown or malformed paths fall through to the primary namespace

use crate::config::UpstreamsConfig;

/// Path prefix selecting the AI namespace.
const AI_PREFIX: &str = "/ai";

/// Where a request should be forwarded: resolved base URL, the API key for
/// that namespace (if any), and the rewritten path. Derived per-request and
/// immutable once computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    pub base_url: String,
    pub api_key: Option<String>,
    pub path: String,
}

impl UpstreamTarget {
    /// Full request URL, without query string.
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.path)
    }
}

/// Maps request paths to upstream targets.
///
/// Built once from the config snapshot: base URLs are pre-joined with their
/// sub-prefixes and the effective API keys are resolved (AI falls back to
/// the primary key when it has none of its own).
#[derive(Debug, Clone)]
pub struct UpstreamResolver {
    primary_base: String,
    primary_key: Option<String>,
    ai_base: String,
    ai_key: Option<String>,
}

impl UpstreamResolver {
    pub fn from_config(upstreams: &UpstreamsConfig) -> Self {
        let primary_key = non_empty(&upstreams.primary.api_key);
        let ai_key = non_empty(&upstreams.ai.api_key).or_else(|| primary_key.clone());

        Self {
            primary_base: join_url(&upstreams.primary.base_url, &upstreams.primary.prefix),
            primary_key,
            ai_base: join_url(&upstreams.ai.base_url, &upstreams.ai.prefix),
            ai_key,
        }
    }

    /// Resolve a routing key (the inbound path with the proxy root already
    /// stripped) to its upstream target.
    pub fn resolve(&self, path: &str) -> UpstreamTarget {
        let path = normalize(path);

        if let Some(rest) = strip_prefix_boundary(&path, AI_PREFIX) {
            UpstreamTarget {
                base_url: self.ai_base.clone(),
                api_key: self.ai_key.clone(),
                path: rest,
            }
        } else {
            UpstreamTarget {
                base_url: self.primary_base.clone(),
                api_key: self.primary_key.clone(),
                path,
            }
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Normalize a path to begin with exactly one leading slash.
/// Empty input becomes `/`.
pub fn normalize(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    format!("/{trimmed}")
}

/// Join a base URL and a sub-prefix, collapsing slashes at the junction.
/// An empty prefix leaves the base untouched (apart from trailing-slash
/// trimming).
pub fn join_url(base: &str, prefix: &str) -> String {
    let base = base.trim_end_matches('/');
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{prefix}")
    }
}

/// Strip `prefix` from `path` when it matches on a segment boundary:
/// `path == prefix` or `path` starts with `prefix` followed by `/`.
/// Returns the remainder (at least `/`). `/aiport` does not match `/ai`.
fn strip_prefix_boundary(path: &str, prefix: &str) -> Option<String> {
    if path == prefix {
        return Some("/".to_string());
    }
    path.strip_prefix(prefix)
        .filter(|rest| rest.starts_with('/'))
        .map(str::to_string)
}

/// Boundary-aware test for "is this path under the proxy root".
/// `/apiary` is not under `/api`.
pub fn under_root(path: &str, root: &str) -> bool {
    path == root
        || path
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Strip the proxy root from an inbound path, yielding the routing key.
/// Paths outside the root are returned unchanged; a path equal to the root
/// yields `/`.
pub fn strip_root<'a>(path: &'a str, root: &str) -> &'a str {
    if path == root {
        return "/";
    }
    match path.strip_prefix(root) {
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}
