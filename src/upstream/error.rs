//! Transport failures of an upstream exchange.

use std::error::Error as _;
use std::time::Duration;

use axum::http::uri::InvalidUri;

/// Everything that can stop an exchange from producing an upstream response.
///
/// Upstream *application* errors (4xx/5xx) are not represented here: those
/// are ordinary responses and are relayed verbatim.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("invalid upstream URL {url:?}")]
    InvalidUri {
        url: String,
        #[source]
        source: InvalidUri,
    },

    #[error("upstream request failed")]
    Transport(#[source] hyper_util::client::legacy::Error),

    #[error("failed to read upstream response body")]
    Body(#[source] axum::Error),

    #[error("upstream did not respond within {}s", .0.as_secs())]
    Timeout(Duration),
}

impl ForwardError {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::InvalidUri { .. } => "invalid_uri",
            ForwardError::Transport(e) if e.is_connect() => "connect",
            ForwardError::Transport(_) => "transport",
            ForwardError::Body(_) => "body",
            ForwardError::Timeout(_) => "timeout",
        }
    }

    /// The error followed by its whole source chain, `: `-separated.
    pub fn describe(&self) -> String {
        let mut message = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}
