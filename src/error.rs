//! Error types for the proxy.
//!
//! Every failure that can surface to the browser is normalized into one
//! response shape: `{"success": false, "message": ..., "data": ...}` with
//! the appropriate status code. Upstream errors are propagated transparently
//! rather than translated.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

pub type ProxyResult<T> = Result<T, ProxyError>;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// Required path with no valid session. Raised by the auth gate before
    /// any upstream call is attempted.
    #[error("Not logged in or session expired")]
    Unauthenticated,

    #[error("Invalid request body: {0}")]
    BadRequest(String),

    /// The outbound call itself failed (connect error, reset, ...).
    #[error("Upstream request failed")]
    Unavailable(#[source] reqwest::Error),

    /// Streaming call whose upstream response carries no body to relay.
    #[error("Upstream response has no body")]
    NoUpstreamStream,

    /// Upstream answered with a non-2xx status. Status and payload are
    /// passed through as-is; `set_cookies` carries session-removal cookies
    /// when the status was 401.
    #[error("{message}")]
    Upstream {
        status: StatusCode,
        message: String,
        data: Option<Value>,
        set_cookies: Vec<HeaderValue>,
    },

    /// Upstream returned 2xx but the payload is missing a field the proxy
    /// needs (e.g. a login response without a token).
    #[error("Unexpected upstream response: {0}")]
    UpstreamShape(&'static str),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) | Self::NoUpstreamStream | Self::UpstreamShape(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Upstream { status, .. } => *status,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %message, "request failed");
        } else {
            tracing::debug!(status = %status, error = %message, "request rejected");
        }

        let (data, set_cookies) = match self {
            Self::Upstream {
                data, set_cookies, ..
            } => (data, set_cookies),
            _ => (None, Vec::new()),
        };

        let mut body = json!({
            "success": false,
            "message": message,
        });
        if let Some(data) = data {
            body["data"] = data;
        }

        let mut response = (status, Json(body)).into_response();
        for cookie in set_cookies {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ProxyError::Unauthenticated.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ProxyError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProxyError::NoUpstreamStream.status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ProxyError::Upstream {
                status: StatusCode::CONFLICT,
                message: "conflict".into(),
                data: None,
                set_cookies: Vec::new(),
            }
            .status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_upstream_error_keeps_set_cookies() {
        let err = ProxyError::Upstream {
            status: StatusCode::UNAUTHORIZED,
            message: "expired".into(),
            data: None,
            set_cookies: vec![HeaderValue::from_static("token=; Max-Age=0")],
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get_all(header::SET_COOKIE).iter().count(), 1);
    }
}
