//! Host-to-Team-Code Resolution
//!
//! Derives the tenant code from the first label of a host:
//! - team-a.example.com      -> "team-a"
//! - team-a.example.com:3000 -> "team-a"
//! - admin.example.com       -> administrative host, never a tenant
//!
//! Everything here is pure. Looking the code up in storage is a separate
//! step (see `TenantLookup`).

use std::fmt;

use serde::Serialize;

/// Subdomains that never identify a team
pub const RESERVED_SUBDOMAINS: &[&str] = &["www", "admin", "api"];

/// Subdomain that marks administrative traffic
pub const ADMIN_SUBDOMAIN: &str = "admin";

/// A validated team code taken from a subdomain label.
///
/// Nonempty, `[a-z0-9-]` only, and never one of [`RESERVED_SUBDOMAINS`].
/// Host names are case-insensitive, so codes are always lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TenantCode(String);

impl TenantCode {
    /// Validate a bare label (no dots, no port) as a team code.
    ///
    /// Used for codes that do not come from a host, such as the code of a
    /// team being registered through the admin API.
    pub fn parse(label: &str) -> Result<Self, TenantResolveError> {
        let label = label.to_ascii_lowercase();
        if label.is_empty() {
            return Err(TenantResolveError::EmptyLabel);
        }

        if RESERVED_SUBDOMAINS.contains(&label.as_str()) {
            return Err(TenantResolveError::ReservedSubdomain(label));
        }

        if !label.chars().all(is_code_char) {
            return Err(TenantResolveError::IllegalCharacters(label));
        }

        Ok(Self(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TenantCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolve a raw host to a team code.
///
/// The host is lowercased and its port dropped first. Checks then run in
/// order and stop at the first failure: localhost, IPv4 literal, fewer than
/// two labels, then the first label itself (empty, reserved, illegal
/// characters).
pub fn resolve_tenant_code(host: &str) -> Result<TenantCode, TenantResolveError> {
    let host = normalize_host(host);
    let host = host.as_str();

    if host == "localhost" {
        return Err(TenantResolveError::Localhost);
    }

    if is_ipv4_literal(host) {
        return Err(TenantResolveError::IpAddress(host.to_string()));
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return Err(TenantResolveError::MissingSubdomain(host.to_string()));
    }

    TenantCode::parse(labels[0])
}

/// Whether the host addresses the administrative subdomain.
///
/// Only the first label is inspected, so `admin.localhost` counts even
/// though it would not resolve to a team.
pub fn is_admin_host(host: &str) -> bool {
    first_label(host).eq_ignore_ascii_case(ADMIN_SUBDOMAIN)
}

/// Drop the port and lowercase
fn normalize_host(host: &str) -> String {
    strip_port(host).to_ascii_lowercase()
}

fn strip_port(host: &str) -> &str {
    host.split(':').next().unwrap_or(host)
}

fn first_label(host: &str) -> &str {
    let host = strip_port(host);
    host.split('.').next().unwrap_or(host)
}

fn is_code_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
}

/// Check if a host is a dotted-quad IPv4 literal (e.g. 192.168.0.1)
fn is_ipv4_literal(host: &str) -> bool {
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() != 4 {
        return false;
    }

    parts
        .iter()
        .all(|p| !p.is_empty() && p.len() <= 3 && p.chars().all(|c| c.is_ascii_digit()))
}

/// Reasons a host does not yield a team code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TenantResolveError {
    #[error("Host is localhost")]
    Localhost,

    #[error("Host is an IP address: {0}")]
    IpAddress(String),

    #[error("Host has no subdomain: {0}")]
    MissingSubdomain(String),

    #[error("Subdomain is empty")]
    EmptyLabel,

    #[error("Reserved subdomain: {0}")]
    ReservedSubdomain(String),

    #[error("Subdomain contains illegal characters: {0}")]
    IllegalCharacters(String),
}
