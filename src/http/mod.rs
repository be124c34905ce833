//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, method filter, CORS, tracing)
//!     → request.rs (upstream URL, header filtering, cookies)
//!     → upstream::UpstreamClient (single attempt, deadline)
//!     → response.rs (relay with framing headers stripped, or 502)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{UpstreamTarget, API_PREFIX, X_REQUEST_ID};
pub use server::HttpServer;
