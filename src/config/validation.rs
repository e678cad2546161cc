//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check addresses and URLs are well formed
//! - Check path policy entries are usable by the auth gate
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig -> Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn error(errors: &mut Vec<ValidationError>, field: &str, message: impl Into<String>) {
    errors.push(ValidationError {
        field: field.to_string(),
        message: message.into(),
    });
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        error(
            &mut errors,
            "listener.bind_address",
            format!("not a valid socket address: {:?}", config.listener.bind_address),
        );
    }

    if !config.proxy.root.starts_with('/') || config.proxy.root.len() < 2 {
        error(
            &mut errors,
            "proxy.root",
            format!("must be a non-root path starting with '/': {:?}", config.proxy.root),
        );
    }

    for (name, upstream) in [
        ("upstream.primary", &config.upstream.primary),
        ("upstream.ai", &config.upstream.ai),
    ] {
        match Url::parse(&upstream.base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => error(
                &mut errors,
                name,
                format!("base_url must use http or https, got {:?}", url.scheme()),
            ),
            Err(e) => error(&mut errors, name, format!("base_url is not a URL: {e}")),
        }
    }

    for (field, paths) in [
        ("auth.public_paths", &config.auth.public_paths),
        ("auth.optional_paths", &config.auth.optional_paths),
    ] {
        for path in paths {
            if !path.starts_with('/') {
                error(&mut errors, field, format!("path must start with '/': {path:?}"));
            }
            if path.matches('*').count() > 1 {
                error(
                    &mut errors,
                    field,
                    format!("at most one wildcard is supported: {path:?}"),
                );
            }
        }
    }

    if config.security.max_body_size == 0 {
        error(&mut errors, "security.max_body_size", "must be greater than zero");
    }
    if config.timeouts.connect_secs == 0 {
        error(&mut errors, "timeouts.connect_secs", "must be greater than zero");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "not-an-addr".into();
        config.upstream.primary.base_url = "ftp://example.com".into();
        config.auth.public_paths.push("no-slash".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.field == "listener.bind_address"));
        assert!(errors.iter().any(|e| e.field == "upstream.primary"));
        assert!(errors.iter().any(|e| e.field == "auth.public_paths"));
    }

    #[test]
    fn test_rejects_double_wildcard() {
        let mut config = ProxyConfig::default();
        config.auth.public_paths.push("/api/*/docs/*".into());
        assert!(validate_config(&config).is_err());
    }
}
