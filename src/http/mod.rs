//! HTTP surface subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, request IDs)
//!     → auth gate (classification, session extraction)
//!     → handlers.rs (auth endpoints, chat passthrough, catch-all forward)
//!     → forwarder (buffered or streaming relay)
//! ```

pub mod handlers;
pub mod server;

pub use server::{AppState, HttpServer};
