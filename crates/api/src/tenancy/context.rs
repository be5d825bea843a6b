//! Request-scoped tenant context

use teamhub_shared::Team;

use super::resolver::{TenantCode, TenantResolveError};
use crate::error::{ApiError, ApiResult};

/// How the tenant of a request was (or was not) determined
#[derive(Debug, Clone, PartialEq)]
pub enum TenantResolution {
    /// Resolution was skipped (exempt path or admin host)
    Exempt,
    /// The host does not name a team
    ResolutionFailed(TenantResolveError),
    /// The host names a team code that no active team owns
    NoTenant(TenantCode),
    /// The host names an existing team
    Resolved(TenantCode, Team),
}

/// Immutable result of tenant resolution for one request.
///
/// Bound once by the tenant middleware and read by handlers through
/// `Extension<TenantContext>`.
#[derive(Debug, Clone)]
pub struct TenantContext {
    host: String,
    is_admin_request: bool,
    resolution: TenantResolution,
}

impl TenantContext {
    pub fn new(host: impl Into<String>, is_admin_request: bool, resolution: TenantResolution) -> Self {
        Self {
            host: host.into(),
            is_admin_request,
            resolution,
        }
    }

    /// Raw host the request was addressed to
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Resolved team code, present whether or not a team owns it
    pub fn team_code(&self) -> Option<&TenantCode> {
        match &self.resolution {
            TenantResolution::NoTenant(code) | TenantResolution::Resolved(code, _) => Some(code),
            TenantResolution::Exempt | TenantResolution::ResolutionFailed(_) => None,
        }
    }

    /// Team owning the resolved code
    pub fn team(&self) -> Option<&Team> {
        match &self.resolution {
            TenantResolution::Resolved(_, team) => Some(team),
            _ => None,
        }
    }

    pub fn is_admin_request(&self) -> bool {
        self.is_admin_request
    }

    pub fn resolution(&self) -> &TenantResolution {
        &self.resolution
    }

    /// The team of this request, for handlers that cannot work without one.
    ///
    /// - unresolvable host -> `InvalidSubdomain` (400)
    /// - code with no team -> `TeamNotFound` (404)
    /// - exempt request    -> `NoTeam` (400)
    pub fn require_team(&self) -> ApiResult<&Team> {
        match &self.resolution {
            TenantResolution::Resolved(_, team) => Ok(team),
            TenantResolution::NoTenant(code) => Err(ApiError::TeamNotFound(code.to_string())),
            TenantResolution::ResolutionFailed(err) => Err(ApiError::InvalidSubdomain(err.clone())),
            TenantResolution::Exempt => Err(ApiError::NoTeam),
        }
    }
}
