//! Outbound request construction.
//!
//! # Responsibilities
//! - Point the request URI at the resolved target
//! - Canonicalize the path, strip the mount path and join onto the
//!   target's base path
//! - Replace `Host`, strip hop-by-hop headers, append X-Forwarded-*
//!
//! # Design Decisions
//! - Pure transformation: no I/O, generic over the body type
//! - Paths outside the mount are rejected with 404, never forwarded
//! - Outbound requests are always HTTP/1.1

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Request, Uri, Version};

use crate::http::response::RequestError;
use crate::routing::{canonicalize, encode_path, MountPath};
use crate::security::headers::{append_forwarded, strip_hop_by_hop, Forwarded};
use crate::upstream::ResolvedTarget;

/// Rewrites inbound requests for the single upstream.
#[derive(Debug, Clone)]
pub struct RequestRewriter {
    target: Arc<ResolvedTarget>,
    mount: MountPath,
    forwarded_proto: &'static str,
}

impl RequestRewriter {
    /// `forwarded_proto` is the protocol clients use to reach the listener.
    pub fn new(target: Arc<ResolvedTarget>, mount: MountPath, forwarded_proto: &'static str) -> Self {
        Self {
            target,
            mount,
            forwarded_proto,
        }
    }

    pub fn target(&self) -> &ResolvedTarget {
        &self.target
    }

    pub fn mount(&self) -> &MountPath {
        &self.mount
    }

    /// Upstream path and query for an inbound URI. The path is canonicalized
    /// the same way the access rules see it.
    pub fn upstream_path_and_query(&self, uri: &Uri) -> Result<String, RequestError> {
        let inbound = canonicalize(uri.path()).ok_or_else(|| RequestError::NotFound(uri.path().to_string()))?;
        let stripped = self
            .mount
            .strip(&inbound)
            .ok_or_else(|| RequestError::NotFound(inbound.clone()))?;

        let mut out = String::with_capacity(self.target.path.len() + stripped.len());
        out.push_str(&self.target.path);
        out.push_str(&encode_path(stripped));

        match (self.target.query.as_deref(), uri.query().filter(|q| !q.is_empty())) {
            (Some(base), Some(extra)) => {
                out.push('?');
                out.push_str(base);
                out.push('&');
                out.push_str(extra);
            }
            (Some(q), None) | (None, Some(q)) => {
                out.push('?');
                out.push_str(q);
            }
            (None, None) => {}
        }
        Ok(out)
    }

    /// Produce the outbound request.
    pub fn rewrite<B>(&self, request: Request<B>, client_addr: SocketAddr) -> Result<Request<B>, RequestError> {
        let (mut parts, body) = request.into_parts();

        let path_and_query = self.upstream_path_and_query(&parts.uri)?;
        let authority = self.target.authority();
        let uri = Uri::builder()
            .scheme(self.target.scheme.transport_scheme())
            .authority(authority.as_str())
            .path_and_query(path_and_query.as_str())
            .build()
            .map_err(|_| RequestError::NotFound(parts.uri.path().to_string()))?;

        let original_host = parts
            .headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.to_string()));

        strip_hop_by_hop(&mut parts.headers);
        append_forwarded(
            &mut parts.headers,
            &Forwarded {
                client_ip: client_addr.ip(),
                proto: self.forwarded_proto,
                host: original_host.as_deref(),
            },
        );

        let host = HeaderValue::from_str(&authority)
            .map_err(|e| RequestError::BadGateway(format!("invalid upstream authority: {}", e)))?;
        parts.headers.insert(header::HOST, host);

        parts.uri = uri;
        parts.version = Version::HTTP_11;

        Ok(Request::from_parts(parts, body))
    }
}
