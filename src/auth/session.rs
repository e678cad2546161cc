//! Session cookie codec.
//!
//! The session lives entirely in two cookies:
//! - `token`: the opaque bearer credential, HttpOnly
//! - `user`: the profile as JSON, readable by browser code so the UI can
//!   show display data without a round trip
//!
//! Both are `SameSite=Lax`, path `/`, 7-day expiry; `Secure` mirrors the
//! deployment (config). A user cookie that fails to parse never invalidates
//! the token: the profile is simply omitted.

use axum::http::HeaderValue;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::Value;

const TOKEN_COOKIE: &str = "token";
const USER_COOKIE: &str = "user";

const SESSION_TTL: time::Duration = time::Duration::days(7);

/// The caller's authenticated identity as understood by the proxy, derived
/// entirely from cookie contents.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque token forwarded upstream as a bearer credential.
    pub token: String,
    /// Structured profile, when the user cookie holds parseable JSON.
    pub user: Option<Value>,
}

/// Produces session-removal cookies for the forwarder's lazy-invalidation
/// side effect (any upstream 401 clears the local session).
pub trait SessionInvalidator: Send + Sync {
    fn removal_headers(&self) -> Vec<HeaderValue>;
}

/// Reads and writes the session cookies.
#[derive(Debug, Clone)]
pub struct SessionCodec {
    secure: bool,
}

impl SessionCodec {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    /// Extract the session from a request's cookies.
    pub fn read(jar: &CookieJar) -> Option<Session> {
        let token = jar
            .get(TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())?;

        let user = jar
            .get(USER_COOKIE)
            .and_then(|c| serde_json::from_str(c.value()).ok());

        Some(Session { token, user })
    }

    /// Persist a freshly issued session into response cookies.
    pub fn write(&self, jar: CookieJar, token: &str, user: Option<&Value>) -> CookieJar {
        let mut jar = jar.add(
            Cookie::build((TOKEN_COOKIE, token.to_string()))
                .path("/")
                .http_only(true)
                .secure(self.secure)
                .same_site(SameSite::Lax)
                .max_age(SESSION_TTL)
                .build(),
        );

        if let Some(user) = user {
            match serde_json::to_string(user) {
                Ok(profile) => {
                    jar = jar.add(
                        Cookie::build((USER_COOKIE, profile))
                            .path("/")
                            .http_only(false)
                            .secure(self.secure)
                            .same_site(SameSite::Lax)
                            .max_age(SESSION_TTL)
                            .build(),
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, "user profile not serializable; skipping user cookie");
                }
            }
        }

        jar
    }

    /// Delete both cookies. The removal cookies are added outright rather
    /// than removed through the jar: `remove` only emits a removal header
    /// for cookies the request actually carried, and both must be expired
    /// unconditionally (the user cookie is often absent). Idempotent.
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        let mut jar = jar;
        for cookie in removal_cookies() {
            jar = jar.add(cookie);
        }
        jar
    }
}

impl SessionInvalidator for SessionCodec {
    fn removal_headers(&self) -> Vec<HeaderValue> {
        removal_cookies()
            .into_iter()
            .filter_map(|c| HeaderValue::from_str(&c.to_string()).ok())
            .collect()
    }
}

fn removal_cookies() -> Vec<Cookie<'static>> {
    [TOKEN_COOKIE, USER_COOKIE]
        .into_iter()
        .map(|name| {
            Cookie::build((name, ""))
                .path("/")
                .max_age(time::Duration::ZERO)
                .build()
        })
        .collect()
}
