//! Teamhub API Library
//!
//! This crate contains the API server components for Teamhub, including the
//! subdomain-based tenant resolution every request passes through.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod tenancy;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
pub use tenancy::{TenantBinder, TenantCache, TenantContext, TenantLookup};
