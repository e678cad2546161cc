//! Request handlers for the proxy surface.
//!
//! The auth endpoints wrap the forwarder's buffered path and manage the
//! session cookies; the chat endpoints use the streaming path; everything
//! else under the proxy root goes through the generic catch-all forward.

use axum::extract::{Request, State};
use axum::http::Method;
use axum::response::Response;
use axum::{Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Session;
use crate::error::{ProxyError, ProxyResult};
use crate::forward::{ForwardMode, ProxyRequest};
use crate::http::server::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST {root}/auth/login
///
/// Forwards credentials to the primary upstream's login endpoint, persists
/// the issued token and profile into cookies, and returns the user. The
/// token is never echoed in the response body.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(credentials): Json<LoginRequest>,
) -> ProxyResult<(CookieJar, Json<Value>)> {
    let data = state
        .forwarder
        .call_json(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({
                "email": credentials.email,
                "password": credentials.password,
            })),
        )
        .await?;

    let token = data
        .get("token")
        .and_then(Value::as_str)
        .ok_or(ProxyError::UpstreamShape("login response missing token"))?;
    let user = data.get("user").filter(|u| !u.is_null()).cloned();

    let jar = state.codec.write(jar, token, user.as_ref());
    tracing::info!("login succeeded");

    Ok((jar, Json(json!({ "success": true, "data": { "user": user } }))))
}

/// POST {root}/auth/logout
///
/// Upstream notification is best-effort; the local session is cleared no
/// matter what the upstream says.
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    jar: CookieJar,
) -> ProxyResult<(CookieJar, Json<Value>)> {
    if let Err(e) = state
        .forwarder
        .call_json(Method::POST, "/auth/logout", Some(&session), None)
        .await
    {
        tracing::warn!(error = %e, "upstream logout failed; clearing local session anyway");
    }

    let jar = state.codec.clear(jar);
    Ok((jar, Json(json!({ "success": true }))))
}

/// GET {root}/auth/me
pub async fn current_user(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ProxyResult<Json<Value>> {
    let user = state
        .forwarder
        .call_json(Method::GET, "/auth/me", Some(&session), None)
        .await?;

    Ok(Json(json!({ "success": true, "data": { "user": user } })))
}

/// POST {root}/chat and {root}/ai/chat
///
/// SSE passthrough: the namespace is picked by the resolver from the path,
/// the body is relayed untouched, and upstream bytes reach the caller as
/// they arrive.
pub async fn chat(State(state): State<AppState>, request: Request) -> ProxyResult<Response> {
    let proxied = ProxyRequest::from_inbound(
        request,
        &state.config.proxy.root,
        state.config.security.max_body_size,
    )
    .await?;

    state.forwarder.forward(proxied, ForwardMode::Streaming).await
}

/// Generic catch-all: any other path under the root is forwarded with
/// method, body and query preserved, and the response returned as-is.
pub async fn forward_any(State(state): State<AppState>, request: Request) -> ProxyResult<Response> {
    let proxied = ProxyRequest::from_inbound(
        request,
        &state.config.proxy.root,
        state.config.security.max_body_size,
    )
    .await?;

    state.forwarder.forward(proxied, ForwardMode::Buffered).await
}
