//! API routes

pub mod admin;
pub mod health;
pub mod teams;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::{
    pipeline::{apply_pipeline, DEFAULT_PIPELINE},
    state::AppState,
};

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Team routes, answered for the team of the request's subdomain
    let team_routes = Router::new()
        .route("/v1/team/info", get(teams::team_info))
        .route("/v1/team/code", get(teams::team_code))
        .route("/v1/team/context", get(teams::tenant_context))
        .route(&state.config.team_list_path, get(teams::list_teams));

    // Admin routes (token required, tenant resolution bypassed)
    let admin_routes = Router::new()
        .route("/teams", post(admin::create_team))
        .route(
            "/teams/:code",
            patch(admin::update_team).delete(admin::delete_team),
        )
        .route("/tenant-cache", get(admin::tenant_cache_stats))
        .route("/tenant-cache/flush", post(admin::flush_tenant_cache))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin::require_admin_token,
        ));

    let router = Router::new()
        .merge(health_routes)
        .merge(team_routes)
        .nest(&state.config.admin_api_prefix, admin_routes)
        .with_state(state.clone());

    apply_pipeline(router, DEFAULT_PIPELINE, &state)
}
