//! HTTP server for active proxy mode.
//!
//! # Responsibilities
//! - Create the Axum Router with the proxy handler
//! - Wire up middleware (request ID, tracing, access control)
//! - Rewrite and forward every request to the single upstream
//! - Serve on a plain or TLS-terminating listener until shutdown

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::http::middleware::access_control_middleware;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response::{from_upstream, RequestError};
use crate::http::rewrite::RequestRewriter;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::net::IngressListener;
use crate::observability::metrics;
use crate::routing::MountPath;
use crate::security::AccessFilter;
use crate::upstream::{ResolvedTarget, UpstreamTransport};

/// Time allowed for in-flight requests once shutdown starts.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the proxy needs, built once at startup.
#[derive(Clone)]
pub struct ProxyContext {
    pub target: Arc<ResolvedTarget>,
    pub mount: MountPath,
    pub filter: Arc<AccessFilter>,
    pub transport: UpstreamTransport,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub rewriter: Arc<RequestRewriter>,
    pub transport: UpstreamTransport,
}

/// HTTP server for the reverse proxy.
pub struct HttpServer {
    router: Router,
    target: Arc<ResolvedTarget>,
}

impl HttpServer {
    /// Create a server. `forwarded_proto` is what the listener presents to
    /// clients and ends up in `X-Forwarded-Proto`.
    pub fn new(ctx: ProxyContext, forwarded_proto: &'static str) -> Self {
        let rewriter = Arc::new(RequestRewriter::new(ctx.target.clone(), ctx.mount, forwarded_proto));

        let state = AppState {
            rewriter,
            transport: ctx.transport,
        };

        let router = Self::build_router(state, ctx.filter);
        Self {
            router,
            target: ctx.target,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState, filter: Arc<AccessFilter>) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(middleware::from_fn_with_state(filter, access_control_middleware))
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer()),
            )
    }

    /// The request handler, pluggable into any listener that supplies
    /// `ConnectInfo<SocketAddr>`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until a shutdown signal arrives.
    pub async fn run(
        self,
        listener: IngressListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.target,
            reachability = %listener.reachability(),
            tls = listener.is_tls(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let (inner, tls) = listener.into_parts();

        match tls {
            None => {
                axum::serve(inner, app)
                    .with_graceful_shutdown(async move {
                        shutdown.recv().await;
                        tracing::info!("Shutdown signal received");
                    })
                    .await?;
            }
            Some(tls) => {
                let handle = axum_server::Handle::new();
                let drain = handle.clone();
                tokio::spawn(async move {
                    shutdown.recv().await;
                    tracing::info!("Shutdown signal received");
                    drain.graceful_shutdown(Some(DRAIN_TIMEOUT));
                });
                axum_server::from_tcp_rustls(inner.into_std()?, tls)
                    .handle(handle)
                    .serve(app)
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler. Rewrites the request and forwards it upstream.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&request).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let outbound = match state.rewriter.rewrite(request, client_addr) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(request_id = %request_id, path = %path, error = %e, "Request not routable");
            metrics::record_request(method.as_str(), e.status().as_u16(), start_time);
            return e.into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        upstream_uri = %outbound.uri(),
        "Proxying request"
    );

    match state.transport.client().request(outbound).await {
        Ok(response) => {
            metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
            from_upstream(response).into_response()
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, path = %path, error = %e, "Upstream error");
            let err = RequestError::BadGateway(e.to_string());
            metrics::record_request(method.as_str(), err.status().as_u16(), start_time);
            err.into_response()
        }
    }
}
