//! Outbound header construction.
//!
//! # Responsibilities
//! - Strip connection- and routing-specific inbound headers
//! - Strip caller-supplied credentials (always recomputed, never relayed)
//! - Attach the session bearer token and the namespace API key

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::auth::Session;
use crate::routing::UpstreamTarget;

/// Static API-key header sent to upstreams that require one.
pub const X_API_KEY: &str = "x-api-key";

/// HeaderName is always lowercase, so this comparison is case-insensitive
/// for any spelling the caller used.
fn is_stripped(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "host"
            | "x-forwarded-for"
            | "x-forwarded-proto"
            | "connection"
            | "content-length"
            | "transfer-encoding"
            | "authorization"
            | "x-api-key"
    )
}

/// Copy inbound headers, dropping everything in the strip list.
pub fn filter_inbound(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::new();
    for (name, value) in headers {
        if !is_stripped(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

/// Attach proxy-computed credentials: `Authorization: Bearer <token>` when a
/// session exists, `X-API-KEY` when the target carries a key. Values that
/// are not valid header values are skipped rather than panicking (the token
/// comes from an untrusted cookie).
pub fn attach_credentials(
    headers: &mut HeaderMap,
    target: &UpstreamTarget,
    session: Option<&Session>,
) {
    if let Some(session) = session {
        match HeaderValue::from_str(&format!("Bearer {}", session.token)) {
            Ok(value) => {
                headers.insert(header::AUTHORIZATION, value);
            }
            Err(_) => {
                tracing::warn!("session token is not a valid header value; not attaching");
            }
        }
    }

    if let Some(key) = &target.api_key {
        match HeaderValue::from_str(key) {
            Ok(value) => {
                headers.insert(HeaderName::from_static(X_API_KEY), value);
            }
            Err(_) => {
                tracing::warn!("configured API key is not a valid header value; not attaching");
            }
        }
    }
}
