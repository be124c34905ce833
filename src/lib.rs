//! Forwarding proxy library.
//!
//! Every inbound request is forwarded to one fixed upstream origin under
//! `/api/` and the upstream's answer is relayed back to the caller.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
