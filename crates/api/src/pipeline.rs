//! Request middleware pipeline
//!
//! The middleware stack is an explicit, ordered list of stages composed at
//! startup. The first stage sees the request first.

use axum::{extract::DefaultBodyLimit, middleware, Router};
use tower_http::trace::TraceLayer;

use crate::{state::AppState, tenancy::bind_tenant};

/// A middleware stage applied around every route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiddlewareStage {
    /// Request/response tracing spans
    RequestTrace,
    /// Global request body size limit
    BodyLimit,
    /// Binds the `TenantContext` of the request
    TenantBinding,
}

/// Stages in the order requests pass through them
pub const DEFAULT_PIPELINE: &[MiddlewareStage] = &[
    MiddlewareStage::RequestTrace,
    MiddlewareStage::BodyLimit,
    MiddlewareStage::TenantBinding,
];

/// Wrap `router` in `stages`, first stage outermost
pub fn apply_pipeline(router: Router, stages: &[MiddlewareStage], state: &AppState) -> Router {
    // Router::layer wraps what is already there, so apply innermost first
    stages.iter().rev().fold(router, |router, stage| match stage {
        MiddlewareStage::RequestTrace => router.layer(TraceLayer::new_for_http()),
        MiddlewareStage::BodyLimit => {
            router.layer(DefaultBodyLimit::max(state.config.max_request_body_bytes))
        }
        MiddlewareStage::TenantBinding => router.layer(middleware::from_fn_with_state(
            state.tenants.clone(),
            bind_tenant,
        )),
    })
}
