//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! outbound request (http::request)
//!     → client.rs (pooled hyper client, decompression, deadline)
//!     → Ok(buffered response)  → http::response::relay
//!     → Err(ForwardError)      → http::response::proxy_error (502)
//! ```
//!
//! # Design Decisions
//! - One attempt per exchange; nothing is retried
//! - Every failure subtype collapses to 502 for the caller
//! - Subtypes survive as `ForwardError::kind` for logs and metrics

pub mod client;
pub mod error;

pub use client::UpstreamClient;
pub use error::ForwardError;
