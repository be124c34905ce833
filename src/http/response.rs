//! Response relay and error mapping.
//!
//! # Responsibilities
//! - Copy the upstream status, headers and body back to the caller
//! - Strip framing headers that no longer describe the relayed body
//! - Map transport failures to 502 Bad Gateway
//!
//! # Design Decisions
//! - Upstream 4xx/5xx are relayed as-is; only transport failures become 502
//! - Repeated headers (e.g. `set-cookie`) survive the relay

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderName, Response, StatusCode};
use axum::response::IntoResponse;

use crate::upstream::ForwardError;

/// The body is buffered and already decoded, so these no longer hold.
const EXCLUDED_RESPONSE_HEADERS: [HeaderName; 3] = [
    header::CONTENT_ENCODING,
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
];

/// Build the caller's response from a buffered upstream response.
pub fn relay(upstream: Response<Bytes>) -> Response<Body> {
    let (parts, body) = upstream.into_parts();

    let mut headers = parts.headers;
    for name in &EXCLUDED_RESPONSE_HEADERS {
        headers.remove(name);
    }
    // One media type, even if the upstream repeated the header.
    if let Some(media_type) = headers.get(header::CONTENT_TYPE).cloned() {
        headers.insert(header::CONTENT_TYPE, media_type);
    }

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = parts.status;
    *response.headers_mut() = headers;
    response
}

/// 502 with a plain-text description of the failure.
pub fn proxy_error(err: &ForwardError) -> Response<Body> {
    (
        StatusCode::BAD_GATEWAY,
        format!("Proxy error: {}", err.describe()),
    )
        .into_response()
}
