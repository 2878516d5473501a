//! HTTP middleware implementations

use axum::{
    extract::{ConnectInfo, Request},
    http::{
        header::{CONTENT_TYPE, EXPIRES, HOST, X_CONTENT_TYPE_OPTIONS},
        HeaderValue,
    },
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

const X_CLACKS_OVERHEAD: &str = "x-clacks-overhead";

/// Log every incoming request
pub async fn log_request(request: Request, next: Next) -> Response {
    let address = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    let host = request
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-");

    tracing::info!(
        method = %request.method(),
        protocol = ?request.version(),
        address = %address,
        host = host,
        url = %request.uri(),
        "Request received"
    );

    next.run(request).await
}

/// Mark every response as an uncacheable plain text script
pub async fn boot_script_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    headers.insert(
        EXPIRES,
        HeaderValue::from_static("Thu, 01 Jan 1970 12:00:00 AM GMT"),
    );
    headers.insert(
        X_CLACKS_OVERHEAD,
        HeaderValue::from_static("GNU Terry Pratchett"),
    );
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));

    response
}
