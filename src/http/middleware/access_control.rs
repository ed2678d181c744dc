//! Access Control Middleware.
//! Enforces the allow/deny path rules before a request reaches the proxy handler.
//! Rules see the canonical path, the same one the rewriter forwards.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::request::request_id;
use crate::http::response::RequestError;
use crate::observability::metrics;
use crate::routing::canonicalize;
use crate::security::{AccessFilter, Decision};

pub async fn access_control_middleware(
    State(filter): State<Arc<AccessFilter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let raw = req.uri().path();

    let rejection = match canonicalize(raw) {
        None => RequestError::NotFound(raw.to_string()),
        Some(path) => match filter.permits(&path) {
            Decision::Allowed => return next.run(req).await,
            Decision::Forbidden => RequestError::Forbidden(path),
            Decision::NotFound => RequestError::NotFound(path),
        },
    };

    tracing::warn!(
        request_id = %request_id(&req),
        method = %req.method(),
        path = %raw,
        status = rejection.status().as_u16(),
        "Request rejected by access rules"
    );
    metrics::record_request(req.method().as_str(), rejection.status().as_u16(), start);

    rejection.into_response()
}
