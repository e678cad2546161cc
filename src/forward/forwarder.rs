//! The request forwarder.
//!
//! # Responsibilities
//! - Resolve the upstream target for each proxied call
//! - Execute buffered (JSON) and streaming (SSE passthrough) forwards
//! - Propagate upstream status codes transparently
//! - Trigger session invalidation on upstream 401 (buffered mode)
//!
//! # Design Decisions
//! - The inbound handler suspends until upstream responds; concurrent
//!   requests are unaffected (no shared mutable state)
//! - Streaming mode relays bytes as they arrive, in order, with no
//!   buffering until stream completion
//! - No total request timeout: the outbound client only bounds connection
//!   establishment, so long-lived streams are never cut off

use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde_json::Value;

use crate::auth::{Session, SessionInvalidator};
use crate::error::{ProxyError, ProxyResult};
use crate::forward::headers::{attach_credentials, filter_inbound};
use crate::routing::{strip_root, UpstreamResolver, UpstreamTarget};

/// How a forward relays the upstream response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardMode {
    /// Read the whole upstream body, relay it with its status code.
    Buffered,
    /// Pipe the upstream byte stream to the caller incrementally.
    Streaming,
}

/// Everything the forwarder needs from an inbound call. Constructed once;
/// read-only afterwards.
#[derive(Debug)]
pub struct ProxyRequest {
    pub method: Method,
    /// Routing key: the inbound path with the proxy root stripped.
    pub path: String,
    /// Raw query string, relayed untouched.
    pub query: Option<String>,
    pub headers: HeaderMap,
    /// Raw body bytes; only read for methods that conventionally carry one.
    pub body: Option<Bytes>,
    pub session: Option<Session>,
}

impl ProxyRequest {
    /// Build from an inbound axum request. The session comes from request
    /// extensions where the auth gate put it.
    pub async fn from_inbound(request: Request, root: &str, max_body: usize) -> ProxyResult<Self> {
        let session = request.extensions().get::<Session>().cloned();
        let (parts, body) = request.into_parts();

        let path = strip_root(parts.uri.path(), root).to_string();
        let query = parts.uri.query().map(str::to_string);

        let body = if matches!(parts.method, Method::POST | Method::PUT | Method::PATCH) {
            let bytes = axum::body::to_bytes(body, max_body)
                .await
                .map_err(|e| ProxyError::BadRequest(format!("failed to read request body: {e}")))?;
            if bytes.is_empty() {
                None
            } else {
                Some(bytes)
            }
        } else {
            None
        };

        Ok(Self {
            method: parts.method,
            path,
            query,
            headers: parts.headers,
            body,
            session,
        })
    }
}

/// Executes proxied calls against the resolved upstreams.
pub struct Forwarder {
    client: reqwest::Client,
    resolver: UpstreamResolver,
    invalidator: Arc<dyn SessionInvalidator>,
}

impl Forwarder {
    pub fn new(
        client: reqwest::Client,
        resolver: UpstreamResolver,
        invalidator: Arc<dyn SessionInvalidator>,
    ) -> Self {
        Self {
            client,
            resolver,
            invalidator,
        }
    }

    /// Forward a proxied request and relay the upstream response.
    pub async fn forward(&self, request: ProxyRequest, mode: ForwardMode) -> ProxyResult<Response> {
        let target = self.resolver.resolve(&request.path);
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            upstream = %target.base_url,
            mode = ?mode,
            "forwarding request"
        );

        match mode {
            ForwardMode::Buffered => self.forward_buffered(request, &target).await,
            ForwardMode::Streaming => self.forward_streaming(request, &target).await,
        }
    }

    /// Buffered call for the proxy's own endpoints (login, logout, me).
    /// Returns the parsed upstream body.
    pub async fn call_json(
        &self,
        method: Method,
        path: &str,
        session: Option<&Session>,
        body: Option<Value>,
    ) -> ProxyResult<Value> {
        let target = self.resolver.resolve(path);
        let (_, _, bytes) = self
            .send_buffered(method, &target, None, HeaderMap::new(), session, body.as_ref())
            .await?;

        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes)
            .map_err(|_| ProxyError::UpstreamShape("body is not valid JSON"))
    }

    async fn forward_buffered(
        &self,
        request: ProxyRequest,
        target: &UpstreamTarget,
    ) -> ProxyResult<Response> {
        let headers = filter_inbound(&request.headers);

        // Structured body: buffered endpoints speak JSON on both sides.
        let body = match &request.body {
            Some(bytes) => Some(
                serde_json::from_slice::<Value>(bytes)
                    .map_err(|e| ProxyError::BadRequest(format!("invalid JSON body: {e}")))?,
            ),
            None => None,
        };

        let (status, upstream_headers, bytes) = self
            .send_buffered(
                request.method,
                target,
                request.query.as_deref(),
                headers,
                request.session.as_ref(),
                body.as_ref(),
            )
            .await?;

        let content_type = upstream_headers
            .get(header::CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));

        let mut response = (status, bytes).into_response();
        response.headers_mut().insert(header::CONTENT_TYPE, content_type);
        Ok(response)
    }

    /// Issue a buffered outbound call with credentials attached. Success
    /// returns the raw response; non-2xx becomes a transparent
    /// `ProxyError::Upstream`, with session removal on 401.
    async fn send_buffered(
        &self,
        method: Method,
        target: &UpstreamTarget,
        query: Option<&str>,
        mut headers: HeaderMap,
        session: Option<&Session>,
        body: Option<&Value>,
    ) -> ProxyResult<(StatusCode, HeaderMap, Bytes)> {
        attach_credentials(&mut headers, target, session);

        let mut builder = self
            .client
            .request(method, build_url(target, query))
            .headers(headers);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(ProxyError::Unavailable)?;
        let status = response.status();
        let upstream_headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(ProxyError::Unavailable)?;

        if status.is_success() {
            Ok((status, upstream_headers, bytes))
        } else {
            Err(self.upstream_error(status, &bytes, target))
        }
    }

    async fn forward_streaming(
        &self,
        request: ProxyRequest,
        target: &UpstreamTarget,
    ) -> ProxyResult<Response> {
        // Streaming endpoints authenticate with the namespace API key, not
        // the caller's session; the body is relayed as opaque bytes.
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        attach_credentials(&mut headers, target, None);

        let mut builder = self
            .client
            .request(request.method, build_url(target, request.query.as_deref()))
            .headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let upstream = builder.send().await.map_err(ProxyError::Unavailable)?;
        let status = upstream.status();

        // An upstream response that declares an empty body has nothing to
        // relay; hyper otherwise always exposes a body channel.
        if status == StatusCode::NO_CONTENT || upstream.content_length() == Some(0) {
            tracing::error!(status = %status, upstream = %target.base_url, "upstream returned no stream");
            return Err(ProxyError::NoUpstreamStream);
        }

        let content_type = copy_or(upstream.headers(), header::CONTENT_TYPE, "text/event-stream");
        let cache_control = copy_or(upstream.headers(), header::CACHE_CONTROL, "no-cache");
        let connection = copy_or(upstream.headers(), header::CONNECTION, "keep-alive");

        let mut response = (status, Body::from_stream(upstream.bytes_stream())).into_response();
        let response_headers = response.headers_mut();
        response_headers.insert(header::CONTENT_TYPE, content_type);
        response_headers.insert(header::CACHE_CONTROL, cache_control);
        response_headers.insert(header::CONNECTION, connection);
        // Intermediaries (nginx et al.) must not buffer the event feed.
        response_headers.insert(
            HeaderName::from_static("x-accel-buffering"),
            HeaderValue::from_static("no"),
        );
        Ok(response)
    }

    fn upstream_error(&self, status: StatusCode, body: &[u8], target: &UpstreamTarget) -> ProxyError {
        let data: Option<Value> = serde_json::from_slice(body).ok();
        let message = data
            .as_ref()
            .and_then(|v| v.get("message").or_else(|| v.get("statusMessage")))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Upstream error")
                    .to_string()
            });

        tracing::error!(
            status = %status,
            upstream = %target.base_url,
            message = %message,
            "upstream error"
        );

        // Lazy invalidation: an expired or revoked token is no longer worth
        // keeping, whatever call surfaced the 401.
        let set_cookies = if status == StatusCode::UNAUTHORIZED {
            tracing::info!("upstream returned 401; clearing local session");
            self.invalidator.removal_headers()
        } else {
            Vec::new()
        };

        ProxyError::Upstream {
            status,
            message,
            data,
            set_cookies,
        }
    }
}

/// Copy a header from the upstream response, falling back to the streaming
/// default when the upstream omitted it.
fn copy_or(headers: &HeaderMap, name: HeaderName, default: &'static str) -> HeaderValue {
    headers
        .get(&name)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(default))
}

fn build_url(target: &UpstreamTarget, query: Option<&str>) -> String {
    match query {
        Some(query) => format!("{}?{}", target.url(), query),
        None => target.url(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_with_query() {
        let target = UpstreamTarget {
            base_url: "http://u/api".into(),
            api_key: None,
            path: "/users".into(),
        };
        assert_eq!(build_url(&target, None), "http://u/api/users");
        assert_eq!(build_url(&target, Some("page=2&q=a")), "http://u/api/users?page=2&q=a");
    }

    #[test]
    fn test_copy_or_prefers_upstream_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=5"));

        assert_eq!(
            copy_or(&headers, header::CACHE_CONTROL, "no-cache"),
            "max-age=5"
        );
        assert_eq!(
            copy_or(&headers, header::CONTENT_TYPE, "text/event-stream"),
            "text/event-stream"
        );
    }
}
