//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (answer preflights, tag responses with allow-* headers)
//!     → Pass to the forwarder
//! ```
//!
//! # Design Decisions
//! - The proxy performs no authentication; the upstream owns auth
//! - Paths are not sanitized, they reach the upstream verbatim

pub mod cors;
