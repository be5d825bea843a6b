//! Team lookup by code, with caching

use std::sync::Arc;

use teamhub_shared::{StoreError, Team, TeamRepository};
use uuid::Uuid;

use super::{cache::TenantCache, resolver::TenantCode};

/// Maps a validated team code to the team that owns it.
///
/// A code nobody owns is `Ok(None)`, a normal outcome (deleted or mistyped
/// team). Only storage failures are errors.
#[derive(Clone)]
pub struct TenantLookup {
    repo: Arc<dyn TeamRepository>,
    cache: Arc<TenantCache>,
}

impl TenantLookup {
    /// Create a lookup with a default cache
    pub fn new(repo: Arc<dyn TeamRepository>) -> Self {
        Self::with_cache(repo, Arc::new(TenantCache::new()))
    }

    /// Create a lookup with a custom cache
    pub fn with_cache(repo: Arc<dyn TeamRepository>, cache: Arc<TenantCache>) -> Self {
        Self { repo, cache }
    }

    pub async fn lookup(&self, code: &TenantCode) -> Result<Option<Team>, StoreError> {
        if let Some(cached) = self.cache.get(code) {
            tracing::trace!(team_code = %code, hit = cached.is_some(), "Tenant cache hit");
            return Ok(cached);
        }

        let generation = self.cache.generation();
        let team = self.repo.find_by_code(code.as_str()).await?;
        if !self.cache.set_if_unchanged(code, team.clone(), generation) {
            tracing::debug!(team_code = %code, "Tenant cache invalidated during lookup, result not cached");
        }

        Ok(team)
    }

    /// Forget every cached entry pointing at a team
    pub fn invalidate_team(&self, team_id: Uuid) {
        self.cache.invalidate_team(team_id);
    }

    /// Called after a team is registered: drops a cached "no such team"
    pub fn team_created(&self, team: &Team) {
        self.invalidate_raw_code(&team.code);
    }

    /// Called after a team changes code or name: drops both codes
    pub fn team_renamed(&self, old_code: &str, team: &Team) {
        self.invalidate_team(team.id);
        self.invalidate_raw_code(old_code);
        self.invalidate_raw_code(&team.code);
    }

    /// Called after a team is removed
    pub fn team_removed(&self, team: &Team) {
        self.invalidate_team(team.id);
        self.invalidate_raw_code(&team.code);
    }

    /// Get the tenant cache for statistics/management
    pub fn cache(&self) -> &TenantCache {
        &self.cache
    }

    // Codes that are not valid tenant codes can never be cached
    fn invalidate_raw_code(&self, code: &str) {
        if let Ok(code) = TenantCode::parse(code) {
            self.cache.invalidate(&code);
        }
    }
}
