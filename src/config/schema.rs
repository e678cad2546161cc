//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.
//! Every section has defaults so a minimal (even empty) config file works.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge proxy.
///
/// Loaded once at startup, validated, and shared read-only via `Arc`.
/// There is no hot reload: the upstream map, credentials and path policy
/// are fixed for the lifetime of the process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Proxy root and routing settings.
    pub proxy: ProxySettings,

    /// Upstream backends (primary REST backend and AI backend).
    pub upstream: UpstreamsConfig,

    /// Authentication gate and session cookie settings.
    pub auth: AuthConfig,

    /// Request size limits.
    pub security: SecurityConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Proxy routing settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Root path under which requests are classified and forwarded.
    /// Requests outside the root bypass the auth gate entirely.
    pub root: String,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            root: "/api".to_string(),
        }
    }
}

/// The two upstream namespaces.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamsConfig {
    /// Primary REST backend.
    pub primary: UpstreamConfig,

    /// AI inference backend, selected by the `/ai` path prefix.
    /// Its API key falls back to the primary key when empty.
    pub ai: UpstreamConfig,
}

/// A single upstream backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL (e.g., "http://127.0.0.1:8000").
    pub base_url: String,

    /// Sub-prefix joined onto the base URL ("api" -> ".../api").
    /// May be empty.
    pub prefix: String,

    /// Static API key sent as `X-API-KEY`. Empty means no key.
    pub api_key: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            prefix: String::new(),
            api_key: String::new(),
        }
    }
}

/// Authentication gate and session cookie settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Paths reachable without a session. Exact match, or a single `*`
    /// wildcard matching any remaining suffix.
    pub public_paths: Vec<String>,

    /// Paths where a session is attached when present but never required.
    /// A path listed in both sets is treated as public.
    pub optional_paths: Vec<String>,

    /// Set the `Secure` flag on session cookies. Enable in production.
    pub secure_cookies: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            public_paths: vec![
                "/api/auth/login".to_string(),
                "/api/auth/register".to_string(),
                "/api/auth/refresh".to_string(),
                "/api/health".to_string(),
            ],
            optional_paths: Vec::new(),
            secure_cookies: false,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration.
///
/// There is deliberately no total request timeout: a deadline on the whole
/// exchange would cut off long-lived streaming responses. Only connection
/// establishment is bounded.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Outbound connection establishment timeout in seconds.
    pub connect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { connect_secs: 5 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.proxy.root, "/api");
        assert_eq!(config.upstream.primary.base_url, "http://127.0.0.1:8000");
        assert!(config
            .auth
            .public_paths
            .contains(&"/api/auth/login".to_string()));
        assert!(!config.auth.secure_cookies);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [upstream.primary]
            base_url = "http://backend:9000"
            prefix = "api"
            api_key = "k1"

            [upstream.ai]
            base_url = "http://ai:9001"
            "#,
        )
        .unwrap();
        assert_eq!(config.upstream.primary.base_url, "http://backend:9000");
        assert_eq!(config.upstream.primary.prefix, "api");
        assert_eq!(config.upstream.ai.base_url, "http://ai:9001");
        assert_eq!(config.upstream.ai.api_key, "");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }
}
