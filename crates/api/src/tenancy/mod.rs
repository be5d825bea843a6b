//! Host-based tenant resolution
//!
//! Every club is served under its own subdomain:
//! - team-a.example.com -> team with code "team-a"
//! - admin.example.com  -> administrative traffic, no team
//! - localhost, bare IPs, hosts without a subdomain -> no team
//!
//! The middleware in this module binds a `TenantContext` to every request;
//! handlers decide for themselves whether they need a team.

mod cache;
mod context;
mod exemption;
mod host;
mod lookup;
mod middleware;
mod resolver;

pub use cache::{CacheStats, TenantCache};
pub use context::{TenantContext, TenantResolution};
pub use exemption::{
    PathExemptionPolicy, DEFAULT_ADMIN_API_PREFIX, DEFAULT_CONSOLE_PREFIX, DEFAULT_TEAM_LIST_PATH,
};
pub use host::{extract_host, X_FORWARDED_HOST};
pub use lookup::TenantLookup;
pub use middleware::{bind_tenant, TenantBinder};
pub use resolver::{
    is_admin_host, resolve_tenant_code, TenantCode, TenantResolveError, ADMIN_SUBDOMAIN,
    RESERVED_SUBDOMAINS,
};
