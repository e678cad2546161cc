//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → gate.rs (only paths under the proxy root are classified)
//!     → policy.rs (public / optional / required)
//!     → session.rs (cookie read; session into request extensions)
//!     → ALLOWED (continue to handler) or REJECTED (401, no upstream call)
//! ```
//!
//! # Design Decisions
//! - Classification happens exactly once per request; terminal states are
//!   final for the request's lifetime
//! - Public paths never read cookies
//! - The proxy treats the token as an opaque bearer credential; its semantic
//!   validity is owned by the upstream backend
//! - Session invalidation on upstream 401 goes through the
//!   `SessionInvalidator` seam so the forwarder stays free of cookie details

pub mod gate;
pub mod policy;
pub mod session;

pub use gate::auth_gate;
pub use policy::{PathClassification, PathPolicy};
pub use session::{Session, SessionCodec, SessionInvalidator};
