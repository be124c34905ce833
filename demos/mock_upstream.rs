//! Stand-in for the upstream application on port 3000.
//!
//! Echoes what it received as JSON so the proxy's rewriting can be
//! inspected with curl:
//!
//! ```text
//! cargo run --example mock_upstream
//! cargo run -- --bind 127.0.0.1:8001
//! curl -i -b sid=x -d '{"a":1}' http://127.0.0.1:8001/widgets
//! ```

use std::net::SocketAddr;

use axum::{body::Bytes, http::HeaderMap, http::Method, http::Uri, Json, Router};
use serde_json::{json, Value};

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let headers: Vec<(String, String)> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    Json(json!({
        "method": method.as_str(),
        "uri": uri.to_string(),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
    }))
}

#[tokio::main]
async fn main() {
    let app = Router::new().fallback(echo);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    println!("Mock upstream listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
