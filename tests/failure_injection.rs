//! Failure injection tests for the forwarding proxy.

use std::time::{Duration, Instant};

use axum::http::{header, StatusCode};
use axum::Router;
use tower_http::compression::CompressionLayer;

mod common;

#[tokio::test]
async fn test_refused_connection_is_bad_gateway() {
    let upstream = common::unused_addr().await;
    let (proxy, shutdown) = common::start_proxy(common::config_for(upstream)).await;

    let res = common::client()
        .get(format!("http://{}/customers", proxy))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert!(res
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    let body = res.text().await.unwrap();
    assert!(body.starts_with("Proxy error:"), "unexpected body: {body}");

    shutdown.trigger();
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let (upstream, captures) = common::start_recording_upstream().await;
    let mut config = common::config_for(upstream);
    config.timeouts.upstream_secs = 1;
    let (proxy, shutdown) = common::start_proxy(config).await;

    let start = Instant::now();
    let res = common::client()
        .get(format!("http://{}/reports/slow", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert!(start.elapsed() < Duration::from_secs(3), "should not wait for the upstream");
    assert_eq!(
        res.text().await.unwrap(),
        "Proxy error: upstream did not respond within 1s"
    );
    assert_eq!(captures.len(), 1, "timed-out exchanges are not retried");

    shutdown.trigger();
}

#[tokio::test]
async fn test_failed_exchange_does_not_affect_others() {
    let (upstream, _captures) = common::start_recording_upstream().await;
    let mut config = common::config_for(upstream);
    config.timeouts.upstream_secs = 1;
    let (proxy, shutdown) = common::start_proxy(config).await;
    let client = common::client();

    let slow = {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .get(format!("http://{}/reports/slow", proxy))
                .send()
                .await
                .unwrap()
                .status()
        })
    };

    let fast = client
        .get(format!("http://{}/reports/daily", proxy))
        .send()
        .await
        .unwrap();
    assert_eq!(fast.status(), StatusCode::OK);
    assert_eq!(fast.text().await.unwrap(), "GET /api/reports/daily");

    assert_eq!(slow.await.unwrap(), StatusCode::BAD_GATEWAY);

    // The proxy keeps serving after a failure.
    let after = client
        .get(format!("http://{}/reports/weekly", proxy))
        .send()
        .await
        .unwrap();
    assert_eq!(after.status(), StatusCode::OK);

    shutdown.trigger();
}

#[tokio::test]
async fn test_malformed_upstream_response_is_bad_gateway() {
    let upstream = common::start_raw_upstream("definitely not http\r\n\r\n").await;
    let (proxy, shutdown) = common::start_proxy(common::config_for(upstream)).await;

    let res = common::client()
        .get(format!("http://{}/club", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert!(res.text().await.unwrap().starts_with("Proxy error:"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_framing_headers_from_upstream_are_not_relayed() {
    let upstream = common::start_raw_upstream(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: application/json\r\n\
         Content-Encoding: identity\r\n\
         Transfer-Encoding: chunked\r\n\
         X-Upstream: raw\r\n\
         Connection: close\r\n\
         \r\n\
         6\r\n{\"ok\":\r\n5\r\ntrue}\r\n0\r\n\r\n",
    )
    .await;
    let (proxy, shutdown) = common::start_proxy(common::config_for(upstream)).await;

    let res = common::client()
        .get(format!("http://{}/organization", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(header::CONTENT_ENCODING).is_none());
    assert!(res.headers().get(header::TRANSFER_ENCODING).is_none());
    assert_eq!(res.headers().get("x-upstream").unwrap(), "raw");
    assert_eq!(res.headers().get(header::CONTENT_TYPE).unwrap(), "application/json");
    // Framing is recomputed for the relayed body.
    assert_eq!(res.headers().get(header::CONTENT_LENGTH).unwrap(), "11");
    assert_eq!(res.text().await.unwrap(), r#"{"ok":true}"#);

    shutdown.trigger();
}

#[tokio::test]
async fn test_compressed_upstream_body_is_relayed_decoded() {
    let payload = "journey goal reached; ".repeat(64);
    let body = payload.clone();
    let app = Router::new()
        .fallback(move || {
            let body = body.clone();
            async move { body }
        })
        .layer(CompressionLayer::new());
    let upstream = common::serve(app).await;
    let (proxy, shutdown) = common::start_proxy(common::config_for(upstream)).await;

    // No Accept-Encoding from this client; the proxy asks for compression
    // itself and must hand back plain bytes.
    let res = common::client()
        .get(format!("http://{}/journey", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(header::CONTENT_ENCODING).is_none());
    assert_eq!(res.text().await.unwrap(), payload);

    shutdown.trigger();
}
