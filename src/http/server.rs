//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the forwarding handler
//! - Restrict inbound methods to the forwarded set
//! - Wire up middleware (CORS, tracing)
//! - Bind server to listener and drain on shutdown
//! - Run one exchange per inbound request

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware,
    response::Response,
    routing::{on, MethodFilter},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ProxyConfig;
use crate::http::request::{build_upstream_request, captured_path, cookies, UpstreamTarget, X_REQUEST_ID};
use crate::http::response::{proxy_error, relay};
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::security::cors::{cors_layer, cors_middleware};
use crate::upstream::UpstreamClient;

/// Methods accepted from callers. Anything else gets 405 from the router.
const FORWARDED_METHODS: MethodFilter = MethodFilter::GET
    .or(MethodFilter::POST)
    .or(MethodFilter::PUT)
    .or(MethodFilter::PATCH)
    .or(MethodFilter::DELETE)
    .or(MethodFilter::OPTIONS);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub target: Arc<UpstreamTarget>,
    pub client: UpstreamClient,
}

/// HTTP server for the forwarding proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let state = AppState {
            target: Arc::new(UpstreamTarget::from_config(&config.upstream)),
            client: UpstreamClient::new(&config.timeouts),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/", on(FORWARDED_METHODS, forward_handler))
            .route("/{*path}", on(FORWARDED_METHODS, forward_handler))
            .with_state(state);

        let router = match cors_layer(&config.cors) {
            Some(cors) => router.layer(middleware::from_fn_with_state(cors, cors_middleware)),
            None => router,
        };

        router.layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for serving it elsewhere.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown_rx` fires, then drain in-flight exchanges.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.origin,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Forwards one inbound request to the upstream and relays the answer.
async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::info_span!(
        "exchange",
        request_id = %request_id,
        method = %request.method(),
        path = %captured_path(request.uri()),
    );

    exchange(state, request).instrument(span).await
}

async fn exchange(state: AppState, request: Request<Body>) -> Response {
    let started = Instant::now();
    let method: Method = request.method().clone();

    tracing::debug!(
        cookies = cookies(request.headers()).len(),
        "Forwarding request"
    );

    let outcome = match build_upstream_request(&state.target, request) {
        Ok(outbound) => {
            tracing::debug!(url = %outbound.uri(), "Sending upstream request");
            state.client.forward(outbound).await
        }
        Err(err) => Err(err),
    };

    match outcome {
        Ok(upstream) => {
            let status = upstream.status();
            tracing::info!(
                status = status.as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Relayed upstream response"
            );
            metrics::record_exchange(method.as_str(), status.as_u16(), started);
            relay(upstream)
        }
        Err(err) => {
            tracing::warn!(
                kind = err.kind(),
                error = %err.describe(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Upstream exchange failed"
            );
            metrics::record_failure(method.as_str(), err.kind(), started);
            proxy_error(&err)
        }
    }
}
