//! Shared utilities for integration testing.
//!
//! Provides a capturing mock upstream (records every request it receives and
//! answers through a caller-supplied responder) plus helpers to spawn the
//! proxy itself on an ephemeral port.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;

use edge_proxy::{HttpServer, ProxyConfig};

/// A snapshot of one request as seen by the mock upstream.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CapturedRequest {
    #[allow(dead_code)]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    #[allow(dead_code)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Handle to a running mock upstream.
pub struct MockUpstream {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<CapturedRequest>>>,
    pub hits: Arc<AtomicU32>,
}

impl MockUpstream {
    #[allow(dead_code)]
    pub fn hit_count(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }

    #[allow(dead_code)]
    pub fn last_request(&self) -> CapturedRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("mock upstream received no requests")
    }
}

/// Starts a mock upstream on an ephemeral port. Every request is captured
/// before `respond` decides the reply.
pub async fn start_mock_upstream<F>(respond: F) -> MockUpstream
where
    F: Fn(&CapturedRequest) -> Response + Clone + Send + Sync + 'static,
{
    let requests: Arc<Mutex<Vec<CapturedRequest>>> = Arc::new(Mutex::new(Vec::new()));
    let hits = Arc::new(AtomicU32::new(0));

    let captured = Arc::clone(&requests);
    let counter = Arc::clone(&hits);
    let app = Router::new().fallback(move |request: Request| {
        let respond = respond.clone();
        let captured = Arc::clone(&captured);
        let counter = Arc::clone(&counter);
        async move {
            let (parts, body) = request.into_parts();
            let bytes = axum::body::to_bytes(body, 1024 * 1024)
                .await
                .unwrap_or_default();
            let snapshot = CapturedRequest {
                method: parts.method,
                uri: parts.uri,
                headers: parts.headers,
                body: bytes,
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let response = respond(&snapshot);
            captured.lock().unwrap().push(snapshot);
            response
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockUpstream {
        addr,
        requests,
        hits,
    }
}

/// Builds a config pointing the primary upstream at `primary`, with defaults
/// everywhere else.
pub fn proxy_config(primary: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.upstream.primary.base_url = format!("http://{primary}");
    config.upstream.primary.api_key = "primary-key".to_string();
    config
}

/// Spawns the proxy on an ephemeral port and returns its address.
pub async fn start_proxy(config: ProxyConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();
    tokio::spawn(async move {
        server.run(listener).await.unwrap();
    });
    addr
}

/// JSON reply with an explicit status, for use inside responders.
#[allow(dead_code)]
pub fn json_response(status: StatusCode, body: serde_json::Value) -> Response {
    (status, axum::Json(body)).into_response()
}

/// An event-stream reply that emits `first` immediately and `second` after
/// `delay`, so tests can observe incremental delivery.
#[allow(dead_code)]
pub fn delayed_sse_response(
    first: &'static str,
    second: &'static str,
    delay: Duration,
) -> Response {
    let stream = futures_util::stream::unfold(0u8, move |step| async move {
        match step {
            0 => Some((
                Ok::<_, std::io::Error>(Bytes::from_static(first.as_bytes())),
                1,
            )),
            1 => {
                tokio::time::sleep(delay).await;
                Some((Ok(Bytes::from_static(second.as_bytes())), 2))
            }
            _ => None,
        }
    });
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .body(Body::from_stream(stream))
        .unwrap()
}
