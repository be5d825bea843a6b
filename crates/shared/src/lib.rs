//! Teamhub Shared Types and Utilities
//!
//! This crate contains the team model, persistence and database helpers
//! shared by the Teamhub services.

pub mod db;
pub mod error;
pub mod teams;
pub mod types;

pub use db::*;
pub use error::StoreError;
pub use teams::{InMemoryTeamRepository, PgTeamRepository, TeamRepository};
pub use types::*;
