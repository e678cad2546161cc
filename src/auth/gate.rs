//! Authentication gate middleware.
//!
//! Per-request state machine: UNCLASSIFIED → CLASSIFIED → {ALLOWED, REJECTED}.
//! Only paths under the proxy root are classified; everything else passes
//! through untouched. Rejection happens before any forwarding, so an
//! unauthenticated required call never costs an upstream round trip.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::policy::PathClassification;
use crate::auth::session::SessionCodec;
use crate::error::ProxyError;
use crate::http::server::AppState;
use crate::routing::under_root;

pub async fn auth_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ProxyError> {
    let path = request.uri().path().to_string();
    let root = &state.config.proxy.root;

    // Outside the proxy root: bypass, no classification.
    if !under_root(&path, root) {
        return Ok(next.run(request).await);
    }

    match state.policy.classify(&path) {
        PathClassification::Public => Ok(next.run(request).await),
        PathClassification::Optional => {
            let jar = CookieJar::from_headers(request.headers());
            if let Some(session) = SessionCodec::read(&jar) {
                request.extensions_mut().insert(session);
            }
            Ok(next.run(request).await)
        }
        PathClassification::Required => {
            let jar = CookieJar::from_headers(request.headers());
            let session = SessionCodec::read(&jar).ok_or(ProxyError::Unauthenticated)?;
            tracing::debug!(path = %path, "session attached");
            request.extensions_mut().insert(session);
            Ok(next.run(request).await)
        }
    }
}
