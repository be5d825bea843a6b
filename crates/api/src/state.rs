//! Shared application state

use std::sync::Arc;

use teamhub_shared::TeamRepository;

use crate::{
    config::Config,
    tenancy::{TenantBinder, TenantCache, TenantLookup},
};

/// State handed to every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub teams: Arc<dyn TeamRepository>,
    pub tenants: TenantBinder,
}

impl AppState {
    pub fn new(config: Config, teams: Arc<dyn TeamRepository>) -> Self {
        let cache = Arc::new(TenantCache::with_limits(
            config.tenant_cache_ttl(),
            config.tenant_cache_negative_ttl(),
            config.tenant_cache_max_entries,
        ));
        let lookup = TenantLookup::with_cache(teams.clone(), cache);
        let tenants = TenantBinder::new(config.exemption_policy(), lookup, &config.server_name);

        Self {
            config: Arc::new(config),
            teams,
            tenants,
        }
    }

    /// Team lookup shared with the tenant middleware
    pub fn lookup(&self) -> &TenantLookup {
        self.tenants.lookup()
    }
}
