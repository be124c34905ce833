//! Cross-origin resource sharing.
//!
//! Browsers talk to the upstream application through this proxy, so the
//! proxy answers preflights itself and decorates relayed responses. With no
//! configured origins every caller origin is mirrored back, credentials
//! included.
//!
//! `CorsLayer` treats every `OPTIONS` request as a preflight. Only requests
//! carrying both `Origin` and `Access-Control-Request-Method` are preflights
//! here; any other `OPTIONS` is forwarded like the remaining methods.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use tower::{service_fn, Layer, ServiceExt};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::config::CorsConfig;

/// Build the CORS layer, or `None` when CORS handling is disabled.
pub fn cors_layer(config: &CorsConfig) -> Option<CorsLayer> {
    if !config.enabled {
        return None;
    }

    let origin = if config.allowed_origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(
            config
                .allowed_origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true),
    )
}

/// True for a CORS preflight: `OPTIONS` with `Origin` and
/// `Access-Control-Request-Method`.
pub fn is_preflight(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS
        && headers.contains_key(header::ORIGIN)
        && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

/// Middleware applying `cors` to everything except non-preflight `OPTIONS`
/// requests, which reach the handler and get the same response decoration
/// as any other cross-origin request.
pub async fn cors_middleware(
    State(cors): State<CorsLayer>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS && !is_preflight(request.method(), request.headers()) {
        let decoration = simple_request_headers(&cors, request.headers()).await;
        let mut response = next.run(request).await;
        decorate(response.headers_mut(), decoration);
        return response;
    }

    match cors.layer(next).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

/// Headers `cors` adds to a non-preflight request carrying `headers`.
async fn simple_request_headers(cors: &CorsLayer, headers: &HeaderMap) -> HeaderMap {
    let mut request = Request::new(Body::empty());
    *request.headers_mut() = headers.clone();

    let empty = service_fn(|_: Request| async { Ok::<_, Infallible>(Response::new(Body::empty())) });
    match cors.layer(empty).oneshot(request).await {
        Ok(response) => response.into_parts().0.headers,
        Err(never) => match never {},
    }
}

fn decorate(target: &mut HeaderMap, mut decoration: HeaderMap) {
    if let Some(vary) = decoration.remove(header::VARY) {
        target.append(header::VARY, vary);
    }
    target.extend(decoration);
}
