//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every exchange produces:
//!     → logging.rs (one span per exchange, outcome event)
//!     → metrics.rs (counters, duration histogram)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Metrics endpoint (Prometheus scrape, opt-in)
//! ```
//!
//! # Design Decisions
//! - Request ID comes from `x-request-id` or is generated, and is only logged
//! - Metrics are cheap and silently disabled without a recorder

pub mod logging;
pub mod metrics;
