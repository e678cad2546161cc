//! Authenticated reverse-proxy edge layer.
//!
//! Terminates browser sessions held in HttpOnly cookies, gates requests by
//! path classification, attaches upstream credentials, routes by namespace
//! (primary REST backend vs. AI backend) and relays responses, including
//! unbuffered server-sent-event streams.

pub mod auth;
pub mod config;
pub mod error;
pub mod forward;
pub mod http;
pub mod routing;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
