//! Raw host extraction
//!
//! Reads the host a client intended to reach, honouring reverse proxies.
//! No validation happens here; the result may be empty or malformed.

use axum::http::{header::HOST, request::Parts};

/// Header set by reverse proxies carrying the original Host
pub const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Extract the raw host of a request.
///
/// Precedence: `X-Forwarded-Host`, then `Host`, then the authority of the
/// request URI, then `server_name` (the name this server answers to).
///
/// A header whose value is not visible ASCII is skipped like a missing one.
pub fn extract_host(parts: &Parts, server_name: &str) -> String {
    header_str(parts, X_FORWARDED_HOST)
        .or_else(|| header_str(parts, HOST.as_str()))
        .map(str::to_string)
        .or_else(|| parts.uri.authority().map(|a| a.as_str().to_string()))
        .unwrap_or_else(|| server_name.to_string())
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|h| h.to_str().ok())
}
