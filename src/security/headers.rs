//! Header manipulation.
//!
//! # Responsibilities
//! - Append X-Forwarded-For, X-Forwarded-Proto, X-Forwarded-Host
//! - Strip hop-by-hop headers in both directions
//!
//! # Design Decisions
//! - Forwarding headers are appended to existing values, never replaced,
//!   so multi-hop chains survive
//! - Headers named in `Connection` are hop-by-hop too

use std::net::IpAddr;

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
///
/// `Upgrade` is dropped as well: protocol upgrades are not proxied.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
    headers.remove(header::UPGRADE);
}

/// Forwarding metadata for one request.
#[derive(Debug, Clone)]
pub struct Forwarded<'a> {
    pub client_ip: IpAddr,
    /// Protocol the client used to reach the listener.
    pub proto: &'a str,
    /// Host the client asked for, if known.
    pub host: Option<&'a str>,
}

/// Append forwarding headers to `headers`.
pub fn append_forwarded(headers: &mut HeaderMap, forwarded: &Forwarded<'_>) {
    append_value(headers, X_FORWARDED_FOR, &forwarded.client_ip.to_string());
    append_value(headers, X_FORWARDED_PROTO, forwarded.proto);
    if let Some(host) = forwarded.host {
        append_value(headers, X_FORWARDED_HOST, host);
    }
}

/// Join `value` onto any existing values as a comma-separated list.
///
/// Existing values are joined as raw bytes; non-UTF-8 hops are kept.
fn append_value(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    let mut joined: Vec<u8> = Vec::new();
    for existing in headers.get_all(&name) {
        joined.extend_from_slice(existing.as_bytes());
        joined.extend_from_slice(b", ");
    }
    joined.extend_from_slice(value.as_bytes());

    match HeaderValue::from_bytes(&joined) {
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(e) => {
            tracing::warn!(header = %name, error = %e, "Dropping unrepresentable forwarding header");
        }
    }
}
