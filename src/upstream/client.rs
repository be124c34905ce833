//! Pooled HTTP client for the upstream application.
//!
//! # Responsibilities
//! - Issue exactly one outbound request per exchange
//! - Bound the whole exchange (response head and body) by one deadline
//! - Decode compressed upstream bodies so they can be relayed plain
//!   (requests without `accept-encoding` advertise gzip, deflate, br, zstd)

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{Request, Response};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tower::{Layer, ServiceExt};
use tower_http::decompression::{Decompression, DecompressionLayer};

use crate::config::TimeoutConfig;
use crate::upstream::error::ForwardError;

type HttpClient = Decompression<Client<HttpConnector, Body>>;

/// Client shared by all exchanges. Cloning is cheap and shares the pool.
#[derive(Clone)]
pub struct UpstreamClient {
    inner: HttpClient,
    timeout: Duration,
}

impl UpstreamClient {
    /// Build a client from the timeout configuration.
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(timeouts.pool_idle_secs))
            .build(connector);

        Self {
            inner: DecompressionLayer::new().layer(client),
            timeout: Duration::from_secs(timeouts.upstream_secs),
        }
    }

    /// Send `request` and buffer the upstream response.
    ///
    /// Dropping the returned future (e.g. because the caller went away)
    /// abandons the outbound request and its connection.
    pub async fn forward(&self, request: Request<Body>) -> Result<Response<Bytes>, ForwardError> {
        let exchange = async {
            let response = self
                .inner
                .clone()
                .oneshot(request)
                .await
                .map_err(ForwardError::Transport)?;

            let (parts, body) = response.into_parts();
            let body = axum::body::to_bytes(Body::new(body), usize::MAX)
                .await
                .map_err(ForwardError::Body)?;

            Ok::<_, ForwardError>(Response::from_parts(parts, body))
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| ForwardError::Timeout(self.timeout))?
    }
}
