//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_exchanges_total` (counter): relayed exchanges by method, status
//! - `proxy_exchange_failures_total` (counter): 502s by method, failure kind
//! - `proxy_exchange_duration_seconds` (histogram): time spent per exchange
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use ::metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const EXCHANGES_TOTAL: &str = "proxy_exchanges_total";
pub const EXCHANGE_FAILURES_TOTAL: &str = "proxy_exchange_failures_total";
pub const EXCHANGE_DURATION_SECONDS: &str = "proxy_exchange_duration_seconds";

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!(EXCHANGES_TOTAL, "Upstream responses relayed to callers");
    describe_counter!(
        EXCHANGE_FAILURES_TOTAL,
        "Exchanges answered with 502 because the upstream could not be reached"
    );
    describe_histogram!(
        EXCHANGE_DURATION_SECONDS,
        Unit::Seconds,
        "Time from receiving a request to having its reply ready"
    );

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_exchange(method: &str, status: u16, started: Instant) {
    counter!(
        EXCHANGES_TOTAL,
        "method" => method.to_owned(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(EXCHANGE_DURATION_SECONDS, "method" => method.to_owned())
        .record(started.elapsed().as_secs_f64());
}

pub fn record_failure(method: &str, kind: &'static str, started: Instant) {
    counter!(
        EXCHANGE_FAILURES_TOTAL,
        "method" => method.to_owned(),
        "kind" => kind
    )
    .increment(1);
    histogram!(EXCHANGE_DURATION_SECONDS, "method" => method.to_owned())
        .record(started.elapsed().as_secs_f64());
}
