//! Team endpoints served on team subdomains

use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Serialize;
use teamhub_shared::Team;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    error::ApiResult,
    state::AppState,
    tenancy::{resolve_tenant_code, TenantContext, TenantResolution},
};

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&Team> for TeamResponse {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id,
            code: team.code.clone(),
            name: team.name.clone(),
            created_at: team.created_at,
            updated_at: team.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TeamCodeResponse {
    pub team_code: String,
}

#[derive(Debug, Serialize)]
pub struct TenantContextResponse {
    pub host: String,
    pub team_code: Option<String>,
    pub team: Option<TeamResponse>,
    pub is_admin_request: bool,
    pub resolution: &'static str,
    pub reason: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Team the request's subdomain belongs to. 400 on a host without a team
/// subdomain, 404 when no team owns the subdomain.
pub async fn team_info(
    Extension(tenant): Extension<TenantContext>,
) -> ApiResult<Json<TeamResponse>> {
    let team = tenant.require_team()?;
    Ok(Json(TeamResponse::from(team)))
}

/// Team code of the request's host, resolved on the spot. Does not check
/// that the team exists.
pub async fn team_code(
    Extension(tenant): Extension<TenantContext>,
) -> ApiResult<Json<TeamCodeResponse>> {
    let code = resolve_tenant_code(tenant.host())?;
    Ok(Json(TeamCodeResponse {
        team_code: code.into_inner(),
    }))
}

/// Describes how the request's tenant was resolved. Never fails.
pub async fn tenant_context(
    Extension(tenant): Extension<TenantContext>,
) -> Json<TenantContextResponse> {
    let (resolution, reason) = match tenant.resolution() {
        TenantResolution::Exempt => ("exempt", None),
        TenantResolution::ResolutionFailed(e) => ("resolution_failed", Some(e.to_string())),
        TenantResolution::NoTenant(_) => ("no_tenant", None),
        TenantResolution::Resolved(_, _) => ("resolved", None),
    };

    Json(TenantContextResponse {
        host: tenant.host().to_string(),
        team_code: tenant.team_code().map(|c| c.to_string()),
        team: tenant.team().map(TeamResponse::from),
        is_admin_request: tenant.is_admin_request(),
        resolution,
        reason,
    })
}

/// List all active teams. Served on any host.
pub async fn list_teams(State(state): State<AppState>) -> ApiResult<Json<Vec<TeamResponse>>> {
    let teams = state.teams.list_active().await?;
    Ok(Json(teams.iter().map(TeamResponse::from).collect()))
}
