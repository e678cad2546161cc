//! Path classification for the auth gate.
//!
//! # Design Decisions
//! - Exact matching, plus a single `*` wildcard matching any remaining
//!   suffix (no regex in the hot path)
//! - A path listed in both the public and optional sets is public: public
//!   paths never read the session, so the stricter-privacy reading wins
//! - Anything not matched is required

use std::collections::HashSet;

use crate::config::AuthConfig;

/// How the auth gate treats a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClassification {
    /// Reachable without any session; cookies are not even read.
    Public,
    /// Session attached when present, never rejected.
    Optional,
    /// 401 without a valid session.
    Required,
}

/// Compiled path sets. Immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct PathPolicy {
    public: Vec<String>,
    optional: HashSet<String>,
}

impl PathPolicy {
    pub fn from_config(auth: &AuthConfig) -> Self {
        Self {
            public: auth.public_paths.clone(),
            optional: auth.optional_paths.iter().cloned().collect(),
        }
    }

    /// Classify a full inbound path. Every reachable proxy path maps to
    /// exactly one classification; public overrides optional.
    pub fn classify(&self, path: &str) -> PathClassification {
        if self.public.iter().any(|p| pattern_matches(p, path)) {
            PathClassification::Public
        } else if self.optional.contains(path) {
            PathClassification::Optional
        } else {
            PathClassification::Required
        }
    }
}

/// A pattern matches exactly, or as a prefix when it contains a `*`
/// wildcard (the wildcard swallows any remaining suffix).
fn pattern_matches(pattern: &str, path: &str) -> bool {
    match pattern.split_once('*') {
        Some((prefix, _)) => path.starts_with(prefix),
        None => pattern == path,
    }
}
