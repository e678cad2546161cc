//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound path ("/api/ai/chat")
//!     → strip_root ("/ai/chat")
//!     → resolver.rs (namespace test, prefix strip)
//!     → UpstreamTarget { base_url, api_key, path }
//! ```
//!
//! # Design Decisions
//! - Resolver compiled from config at startup, immutable at runtime
//! - Pure string matching, no regex, no I/O
//! - Deterministic: same path always resolves to the same target
//! - Malformed input degrades to the primary namespace, never panics

pub mod resolver;

pub use resolver::{strip_root, under_root, UpstreamResolver, UpstreamTarget};
