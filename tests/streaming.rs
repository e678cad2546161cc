//! Tests for the SSE passthrough path: incremental delivery, streaming
//! headers, credential handling and the empty-upstream-body failure.

mod common;

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;
use futures_util::StreamExt;
use serde_json::{json, Value};

use common::{delayed_sse_response, json_response, proxy_config, start_mock_upstream, start_proxy};

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

const EVENT_A: &str = "data: {\"delta\":\"Hello\"}\n\n";
const EVENT_B: &str = "data: [DONE]\n\n";

#[tokio::test]
async fn test_chat_stream_delivers_chunks_incrementally() {
    let delay = Duration::from_millis(600);
    let upstream =
        start_mock_upstream(move |_| delayed_sse_response(EVENT_A, EVENT_B, delay)).await;
    let proxy = start_proxy(proxy_config(upstream.addr)).await;

    let started = Instant::now();
    let response = client()
        .post(format!("http://{proxy}/api/chat"))
        .header("cookie", "token=tok-9")
        .json(&json!({"prompt": "hi"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/event-stream"
    );
    assert_eq!(response.headers().get("cache-control").unwrap(), "no-cache");
    assert_eq!(response.headers().get("x-accel-buffering").unwrap(), "no");

    let mut stream = response.bytes_stream();
    let mut collected = Vec::new();
    let mut first_chunk_at = None;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.unwrap();
        if first_chunk_at.is_none() && !chunk.is_empty() {
            first_chunk_at = Some(started.elapsed());
        }
        collected.extend_from_slice(&chunk);
    }
    let finished = started.elapsed();

    // The first event must arrive well before the upstream emits the
    // second one; a buffering proxy would deliver both together.
    let first_chunk_at = first_chunk_at.unwrap();
    assert!(
        first_chunk_at < Duration::from_millis(400),
        "first chunk took {first_chunk_at:?}, stream is being buffered"
    );
    assert!(finished >= delay, "stream finished before the second event");
    assert_eq!(collected, [EVENT_A, EVENT_B].concat().into_bytes());
}

#[tokio::test]
async fn test_chat_relays_opaque_body_with_api_key_only() {
    let upstream = start_mock_upstream(|_| {
        delayed_sse_response(EVENT_A, EVENT_B, Duration::from_millis(10))
    })
    .await;
    let proxy = start_proxy(proxy_config(upstream.addr)).await;

    // Not JSON; the proxy must relay it untouched and let the upstream
    // decide whether it is acceptable.
    let response = client()
        .post(format!("http://{proxy}/api/chat"))
        .header("cookie", "token=tok-9")
        .header("authorization", "Bearer forged")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let seen = upstream.last_request();
    assert_eq!(seen.path(), "/chat");
    assert_eq!(&seen.body[..], b"{not json");
    assert_eq!(seen.header("content-type"), Some("application/json"));
    assert_eq!(seen.header("x-api-key"), Some("primary-key"));
    // Streaming calls authenticate with the API key alone.
    assert!(seen.header("authorization").is_none());
}

#[tokio::test]
async fn test_chat_requires_session() {
    let upstream = start_mock_upstream(|_| {
        delayed_sse_response(EVENT_A, EVENT_B, Duration::from_millis(10))
    })
    .await;
    let proxy = start_proxy(proxy_config(upstream.addr)).await;

    let response = client()
        .post(format!("http://{proxy}/api/chat"))
        .json(&json!({"prompt": "hi"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(upstream.hit_count(), 0);
}

#[tokio::test]
async fn test_chat_empty_upstream_body_is_bad_gateway() {
    let upstream = start_mock_upstream(|_| {
        Response::builder()
            .status(StatusCode::OK)
            .body(Body::empty())
            .unwrap()
    })
    .await;
    let proxy = start_proxy(proxy_config(upstream.addr)).await;

    let response = client()
        .post(format!("http://{proxy}/api/chat"))
        .header("cookie", "token=tok-9")
        .json(&json!({"prompt": "hi"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Upstream response has no body"));
}

#[tokio::test]
async fn test_chat_propagates_upstream_status_with_body() {
    let upstream = start_mock_upstream(|_| {
        json_response(StatusCode::TOO_MANY_REQUESTS, json!({"message": "slow down"}))
    })
    .await;
    let proxy = start_proxy(proxy_config(upstream.addr)).await;

    let response = client()
        .post(format!("http://{proxy}/api/chat"))
        .header("cookie", "token=tok-9")
        .json(&json!({"prompt": "hi"}))
        .send()
        .await
        .unwrap();

    // Streaming mode relays the status and body verbatim; no session
    // invalidation, no error rewriting.
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .next()
        .is_none());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], json!("slow down"));
}

#[tokio::test]
async fn test_ai_chat_uses_ai_namespace_key() {
    let primary = start_mock_upstream(|_| {
        delayed_sse_response(EVENT_A, EVENT_B, Duration::from_millis(10))
    })
    .await;
    let ai = start_mock_upstream(|_| {
        delayed_sse_response(EVENT_A, EVENT_B, Duration::from_millis(10))
    })
    .await;

    let mut config = proxy_config(primary.addr);
    config.upstream.ai.base_url = format!("http://{}", ai.addr);
    config.upstream.ai.api_key = "ai-key".to_string();
    let proxy = start_proxy(config).await;

    let response = client()
        .post(format!("http://{proxy}/api/ai/chat"))
        .header("cookie", "token=tok-9")
        .json(&json!({"prompt": "hi"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let seen = ai.last_request();
    assert_eq!(seen.path(), "/chat");
    assert_eq!(seen.header("x-api-key"), Some("ai-key"));
    assert_eq!(primary.hit_count(), 0);
}
