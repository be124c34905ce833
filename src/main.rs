//! Forwarding proxy (v1)
//!
//! Forwards every request to a single upstream application.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌───────────────────────────────────────────────┐
//!                          │               FORWARDING PROXY                │
//!     Client Request       │  ┌────────┐   ┌──────────┐   ┌─────────────┐  │
//!     ─────────────────────┼─▶│  cors  │──▶│ request  │──▶│  upstream   │──┼──▶ <origin>/api/<path>
//!                          │  │ +trace │   │ rewrite  │   │   client    │  │
//!                          │  └────────┘   └──────────┘   └──────┬──────┘  │
//!                          │                                     │         │
//!     Client Response      │               ┌──────────┐          │         │
//!     ◀────────────────────┼───────────────│  relay   │◀─────────┘         │
//!                          │               │ or 502   │                    │
//!                          │               └──────────┘                    │
//!                          └───────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use forwarding_proxy::config::loader::{read_config, validate};
use forwarding_proxy::lifecycle::signals;
use forwarding_proxy::observability::{logging, metrics};
use forwarding_proxy::{HttpServer, ProxyConfig, Shutdown};

#[derive(Parser)]
#[command(name = "forwarding-proxy", version)]
#[command(about = "Forwards every request to a single upstream application under /api/", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:8001
    #[arg(short, long, env = "PROXY_BIND")]
    bind: Option<String>,

    /// Upstream origin, e.g. http://localhost:3000
    #[arg(short, long, env = "PROXY_UPSTREAM_ORIGIN")]
    upstream: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<ProxyConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(origin) = self.upstream {
            config.upstream.origin = origin;
        }
        validate(&config)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init_logging(&config.observability);

    tracing::info!("forwarding-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.origin,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        cors = config.cors.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::listen(shutdown.clone()));

    HttpServer::new(config).run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
