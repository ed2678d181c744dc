//! Response handling and transformation.
//!
//! # Responsibilities
//! - Map request-time failures to explicit status codes
//! - Strip hop-by-hop headers from upstream responses
//! - Stream upstream bodies without buffering

use axum::body::Body;
use axum::http::{Response, StatusCode};
use axum::response::IntoResponse;
use hyper::body::Incoming;
use thiserror::Error;

use crate::security::headers::strip_hop_by_hop;

/// Failure isolated to a single request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("path {0:?} is denied")]
    Forbidden(String),

    #[error("path {0:?} is not served")]
    NotFound(String),

    #[error("upstream request failed: {0}")]
    BadGateway(String),
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::Forbidden(_) => StatusCode::FORBIDDEN,
            RequestError::NotFound(_) => StatusCode::NOT_FOUND,
            RequestError::BadGateway(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let reason = status.canonical_reason().unwrap_or("Error");
        (status, reason).into_response()
    }
}

/// Turn an upstream response into the client response.
pub fn from_upstream(response: Response<Incoming>) -> Response<Body> {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}
