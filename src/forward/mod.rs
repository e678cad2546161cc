//! Request forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! ProxyRequest (built once from the inbound call)
//!     → resolver (namespace + rewritten path)
//!     → headers.rs (filter inbound, attach credentials)
//!     → outbound call (reqwest)
//!     → buffered: relay parsed body + status
//!     → streaming: relay bytes as they arrive, no buffering
//! ```
//!
//! # Design Decisions
//! - One forward capability with a mode flag; resolver and credential logic
//!   are never duplicated between the buffered and streaming paths
//! - Upstream status codes propagate transparently
//! - Any buffered-mode 401 from upstream triggers session removal through
//!   the `SessionInvalidator` seam

pub mod forwarder;
pub mod headers;

pub use forwarder::{ForwardMode, Forwarder, ProxyRequest};
