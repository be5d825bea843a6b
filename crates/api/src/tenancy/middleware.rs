//! Tenant binding middleware
//!
//! Runs on every request before the handlers:
//! exemption check -> host extraction -> code resolution -> team lookup ->
//! `TenantContext` inserted into the request extensions.
//!
//! An unresolvable host never rejects the request. Handlers that need a team
//! ask for one with `TenantContext::require_team`.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use teamhub_shared::StoreError;

use super::{
    context::{TenantContext, TenantResolution},
    exemption::PathExemptionPolicy,
    host::extract_host,
    lookup::TenantLookup,
    resolver::{is_admin_host, resolve_tenant_code},
};
use crate::error::ApiError;

/// Everything the tenant middleware needs, shared across requests
#[derive(Clone)]
pub struct TenantBinder {
    policy: Arc<PathExemptionPolicy>,
    lookup: TenantLookup,
    server_name: Arc<str>,
}

impl TenantBinder {
    pub fn new(policy: PathExemptionPolicy, lookup: TenantLookup, server_name: &str) -> Self {
        Self {
            policy: Arc::new(policy),
            lookup,
            server_name: Arc::from(server_name),
        }
    }

    pub fn lookup(&self) -> &TenantLookup {
        &self.lookup
    }

    /// Compute the tenant context for a request.
    ///
    /// Only a storage failure during lookup is an error.
    pub async fn bind(&self, parts: &Parts) -> Result<TenantContext, StoreError> {
        let path = parts.uri.path();
        let host = extract_host(parts, &self.server_name);
        let is_admin = is_admin_host(&host);

        if self.policy.is_exempt(path, &host) {
            tracing::debug!(%host, path, is_admin, "Tenant resolution skipped for exempt request");
            return Ok(TenantContext::new(host, is_admin, TenantResolution::Exempt));
        }

        let code = match resolve_tenant_code(&host) {
            Ok(code) => code,
            Err(e) => {
                tracing::debug!(%host, path, reason = %e, "Host does not resolve to a team");
                return Ok(TenantContext::new(
                    host,
                    is_admin,
                    TenantResolution::ResolutionFailed(e),
                ));
            }
        };

        let resolution = match self.lookup.lookup(&code).await? {
            Some(team) => {
                tracing::debug!(%host, team_code = %code, team_id = %team.id, "Tenant resolved");
                TenantResolution::Resolved(code, team)
            }
            None => {
                tracing::debug!(%host, team_code = %code, "No team owns this code");
                TenantResolution::NoTenant(code)
            }
        };

        Ok(TenantContext::new(host, is_admin, resolution))
    }
}

/// Middleware binding a [`TenantContext`] to every request
pub async fn bind_tenant(
    State(binder): State<TenantBinder>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();

    // Bound at most once per request
    if parts.extensions.get::<TenantContext>().is_none() {
        let context = binder.bind(&parts).await.map_err(|e| {
            tracing::error!(error = %e, "Tenant lookup failed");
            ApiError::from(e)
        })?;
        parts.extensions.insert(context);
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}
