//! HTTP API server implementation

use crate::api::{middleware, routes};
use crate::app::AppState;
use anyhow::{Context, Result};
use axum::Router;
use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

/// Requests taking longer than this are answered with 408
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP API server
pub struct ApiServer {
    app: Router,
    addr: String,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(state: Arc<AppState>) -> Result<Self> {
        let global = &state.resolver.config().global;
        let addr = global.bind_address.clone();
        let prefix = global.path_prefix.clone();

        let app = build_router(state);

        info!(
            address = %addr,
            default = %format!("{}/default", prefix),
            group = %format!("{}/group/:group", prefix),
            mac = %format!("{}/mac/:mac", prefix),
            serial = %format!("{}/serial/:serial", prefix),
            "Setting up HTTP handlers"
        );

        Ok(Self { app, addr })
    }

    /// Run the API server until `shutdown` resolves
    pub async fn run<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&self.addr)
            .await
            .with_context(|| format!("Can't bind web server to {}", self.addr))?;

        info!("API server listening on {}", self.addr);

        axum::serve(
            listener,
            self.app
                .clone()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .context("API server error")?;

        info!("API server shutdown complete");
        Ok(())
    }
}

/// Build the full router, routes nested under the configured path prefix
pub fn build_router(state: Arc<AppState>) -> Router {
    let prefix = state.resolver.config().global.path_prefix.clone();

    let routes = if prefix.is_empty() {
        routes::create_routes()
    } else {
        Router::new().nest(&prefix, routes::create_routes())
    };

    routes
        .layer(axum::middleware::from_fn(middleware::boot_script_headers))
        .layer(axum::middleware::from_fn(middleware::log_request))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use config::ConfigLoader;
    use tower::util::ServiceExt;

    const PREFIXED_CONFIG: &str = r#"
global:
  url: "http://127.0.0.1:8080/boot/"
images:
  rescue:
    action: ["chain rescue.ipxe"]
nodes:
  n1:
    serial: "SN1"
    image: rescue
"#;

    fn router(yaml: &str) -> Router {
        let config = ConfigLoader::load_from_str(yaml).unwrap();
        build_router(Arc::new(AppState::new(Arc::new(config))))
    }

    async fn send(app: Router, uri: &str) -> axum::response::Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_routes_nested_under_prefix() {
        let response = send(router(PREFIXED_CONFIG), "/boot/serial/SN1").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"#!ipxe\nchain rescue.ipxe");

        let response = send(router(PREFIXED_CONFIG), "/serial/SN1").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_boot_script_headers() {
        for uri in ["/default", "/mac/unknown"] {
            let response = send(router(""), uri).await;
            let headers = response.headers();

            assert_eq!(headers["content-type"], "text/plain");
            assert_eq!(headers["expires"], "Thu, 01 Jan 1970 12:00:00 AM GMT");
            assert_eq!(headers["x-clacks-overhead"], "GNU Terry Pratchett");
            assert_eq!(headers["x-content-type-options"], "nosniff");
        }
    }

    #[tokio::test]
    async fn test_server_uses_configured_address() {
        let config = ConfigLoader::load_from_str(PREFIXED_CONFIG).unwrap();
        let server = ApiServer::new(Arc::new(AppState::new(Arc::new(config)))).unwrap();
        assert_eq!(server.addr, "127.0.0.1:8080");
    }
}
