//! Administrative team management
//!
//! Mounted under the admin API prefix, which bypasses tenant resolution.
//! Every mutation invalidates the tenant cache so requests see the change
//! immediately.

use axum::{
    extract::{Path, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use subtle::ConstantTimeEq;
use teamhub_shared::{NewTeam, TeamUpdate};

use crate::{
    error::{ApiError, ApiResult},
    routes::teams::TeamResponse,
    state::AppState,
    tenancy::{CacheStats, TenantCode},
};

/// Require `Authorization: Bearer <ADMIN_API_TOKEN>`
pub async fn require_admin_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let matches: bool = provided
        .as_bytes()
        .ct_eq(state.config.admin_api_token.as_bytes())
        .into();
    if !matches {
        tracing::warn!(path = %request.uri().path(), "Rejected admin request with invalid token");
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Codes are stored lowercase, the form every subdomain resolves to
fn validate_code(code: &str) -> ApiResult<TenantCode> {
    TenantCode::parse(code.trim())
        .map_err(|e| ApiError::Validation(format!("Invalid team code: {}", e)))
}

fn validate_name(name: &str) -> ApiResult<String> {
    let name = name.trim();
    if name.is_empty() || name.len() > 255 {
        return Err(ApiError::Validation(
            "Team name must be between 1 and 255 characters".to_string(),
        ));
    }
    Ok(name.to_string())
}

/// Register a team
pub async fn create_team(
    State(state): State<AppState>,
    Json(req): Json<NewTeam>,
) -> ApiResult<(StatusCode, Json<TeamResponse>)> {
    let code = validate_code(&req.code)?;
    let name = validate_name(&req.name)?;

    let team = state
        .teams
        .create(NewTeam {
            code: code.into_inner(),
            name,
        })
        .await?;
    state.lookup().team_created(&team);

    tracing::info!(team_id = %team.id, team_code = %team.code, "Team created");
    Ok((StatusCode::CREATED, Json(TeamResponse::from(&team))))
}

/// Change a team's code and/or name
pub async fn update_team(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<TeamUpdate>,
) -> ApiResult<Json<TeamResponse>> {
    let code = code.trim().to_lowercase();
    if req.is_empty() {
        return Err(ApiError::Validation(
            "Nothing to update: provide code and/or name".to_string(),
        ));
    }

    let update = TeamUpdate {
        code: req
            .code
            .as_deref()
            .map(|c| validate_code(c).map(TenantCode::into_inner))
            .transpose()?,
        name: req.name.as_deref().map(validate_name).transpose()?,
    };

    let team = state.teams.update(&code, update).await?;
    state.lookup().team_renamed(&code, &team);

    tracing::info!(team_id = %team.id, old_code = %code, team_code = %team.code, "Team updated");
    Ok(Json(TeamResponse::from(&team)))
}

/// Soft-delete a team
pub async fn delete_team(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<StatusCode> {
    let code = code.trim().to_lowercase();
    let team = state.teams.soft_delete(&code).await?;
    state.lookup().team_removed(&team);

    tracing::info!(team_id = %team.id, team_code = %team.code, "Team deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Tenant cache statistics
pub async fn tenant_cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.lookup().cache().stats())
}

/// Drop every cached tenant lookup
pub async fn flush_tenant_cache(State(state): State<AppState>) -> StatusCode {
    state.lookup().cache().clear();
    tracing::info!("Tenant cache flushed");
    StatusCode::NO_CONTENT
}
