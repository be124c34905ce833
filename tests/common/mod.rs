//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode, Uri},
    response::{AppendHeaders, IntoResponse, Response},
    Router,
};
use forwarding_proxy::{HttpServer, ProxyConfig, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// What the mock upstream saw.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone, Default)]
pub struct Captures(Arc<Mutex<Vec<CapturedRequest>>>);

impl Captures {
    pub fn all(&self) -> Vec<CapturedRequest> {
        self.0.lock().unwrap().clone()
    }

    pub fn last(&self) -> CapturedRequest {
        self.all().pop().expect("upstream saw no request")
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

/// Records every request, then answers according to the path:
/// - `.../missing` → 404 JSON
/// - `.../slow` → sleeps 3s, then 200
/// - `.../session` → 200 with two `set-cookie` headers
/// - anything else → 200 `"<METHOD> <path>"`
async fn record(State(captures): State<Captures>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    captures.0.lock().unwrap().push(CapturedRequest {
        method: parts.method.clone(),
        uri: parts.uri.clone(),
        headers: parts.headers.clone(),
        body,
    });

    let path = parts.uri.path().to_owned();
    if path.ends_with("/missing") {
        return (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"error":"Customer not found"}"#,
        )
            .into_response();
    }
    if path.ends_with("/slow") {
        tokio::time::sleep(Duration::from_secs(3)).await;
    }
    if path.ends_with("/session") {
        return (
            AppendHeaders([
                (header::SET_COOKIE, "ice_token=abc; Path=/; HttpOnly"),
                (header::SET_COOKIE, "theme=dark; Path=/"),
            ]),
            "ok",
        )
            .into_response();
    }

    (
        [("x-upstream-path", path.clone())],
        format!("{} {}", parts.method, path),
    )
        .into_response()
}

/// Start a recording upstream on a free port.
pub async fn start_recording_upstream() -> (SocketAddr, Captures) {
    let captures = Captures::default();
    let app = Router::new().fallback(record).with_state(captures.clone());
    (serve(app).await, captures)
}

/// Serve an arbitrary router on a free port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start an upstream that answers every connection with `response` verbatim.
pub async fn start_raw_upstream(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut request = Vec::new();
                        let mut buf = [0u8; 1024];
                        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => request.extend_from_slice(&buf[..n]),
                            }
                        }
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Default config pointed at `upstream`.
pub fn config_for(upstream: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.upstream.origin = format!("http://{}", upstream);
    config
}

/// Run the proxy on a free port.
pub async fn start_proxy(mut config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config);
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
