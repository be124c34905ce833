//! Outbound request construction.
//!
//! # Responsibilities
//! - Derive the upstream URL from the fixed origin and the captured path
//! - Drop the headers the client layer recomputes (host, content-length)
//! - Canonicalize cookies into a single header line
//! - Hand the inbound body over untouched
//!
//! # Design Decisions
//! - The captured path is used verbatim: no normalization, no sanitization
//! - The origin is injected at construction, never read from the request
//! - Header names are matched case-insensitively (`HeaderMap` semantics)

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Uri};

use crate::config::UpstreamConfig;
use crate::upstream::ForwardError;

/// Prefix inserted between the origin and the captured path.
pub const API_PREFIX: &str = "/api/";

/// Correlation header read for logging.
pub const X_REQUEST_ID: &str = "x-request-id";

const EXCLUDED_REQUEST_HEADERS: [HeaderName; 2] = [header::HOST, header::CONTENT_LENGTH];

/// Where exchanges are sent.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    origin: String,
    forward_query: bool,
}

impl UpstreamTarget {
    /// Target the given origin, e.g. `http://localhost:3000`.
    pub fn new(origin: impl Into<String>) -> Self {
        let mut origin = origin.into();
        while origin.ends_with('/') {
            origin.pop();
        }
        Self {
            origin,
            forward_query: false,
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(config.origin.clone()).with_forward_query(config.forward_query)
    }

    /// Also carry the inbound query string over to the upstream URL.
    pub fn with_forward_query(mut self, forward_query: bool) -> Self {
        self.forward_query = forward_query;
        self
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// `<origin>/api/<path>`, plus `?<query>` when query forwarding is on.
    pub fn url_for(&self, path: &str, query: Option<&str>) -> String {
        let mut url = format!("{}{}{}", self.origin, API_PREFIX, path);
        if let (true, Some(query)) = (self.forward_query, query) {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

/// The inbound path without its leading slash, still percent-encoded.
pub fn captured_path(uri: &Uri) -> &str {
    let path = uri.path();
    path.strip_prefix('/').unwrap_or(path)
}

/// Remove the headers that must not reach the upstream.
pub fn strip_request_headers(headers: &mut HeaderMap) {
    for name in &EXCLUDED_REQUEST_HEADERS {
        headers.remove(name);
    }
}

/// Fold repeated `cookie` lines (as sent over HTTP/2) into one.
pub fn canonicalize_cookies(headers: &mut HeaderMap) {
    if headers.get_all(header::COOKIE).iter().count() < 2 {
        return;
    }

    let joined = headers
        .get_all(header::COOKIE)
        .iter()
        .map(HeaderValue::as_bytes)
        .collect::<Vec<_>>()
        .join(&b"; "[..]);

    if let Ok(value) = HeaderValue::from_bytes(&joined) {
        headers.insert(header::COOKIE, value);
    }
}

/// Cookie name/value pairs in the order they were sent.
pub fn cookies(headers: &HeaderMap) -> Vec<(&str, &str)> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .collect()
}

/// Turn an inbound request into the request sent to the upstream.
///
/// Method, cookies and body carry over unchanged. The HTTP version is left
/// to the client so HTTP/2 callers can still reach an HTTP/1.1 upstream.
pub fn build_upstream_request(
    target: &UpstreamTarget,
    request: Request<Body>,
) -> Result<Request<Body>, ForwardError> {
    let (parts, body) = request.into_parts();

    let url = target.url_for(captured_path(&parts.uri), parts.uri.query());
    let uri = match url.parse::<Uri>() {
        Ok(uri) => uri,
        Err(source) => return Err(ForwardError::InvalidUri { url, source }),
    };

    let mut headers = parts.headers;
    strip_request_headers(&mut headers);
    canonicalize_cookies(&mut headers);

    let mut outbound = Request::new(body);
    *outbound.method_mut() = parts.method;
    *outbound.uri_mut() = uri;
    *outbound.headers_mut() = headers;
    Ok(outbound)
}
