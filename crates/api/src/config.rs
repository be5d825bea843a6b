//! Application configuration

use std::env;
use std::time::Duration;

use crate::tenancy::{
    PathExemptionPolicy, DEFAULT_ADMIN_API_PREFIX, DEFAULT_CONSOLE_PREFIX, DEFAULT_TEAM_LIST_PATH,
};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,
    /// Name this server answers to when a request carries no host at all
    pub server_name: String,
    pub max_request_body_bytes: usize,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Tenancy
    pub admin_api_prefix: String,
    pub console_prefix: String,
    pub team_list_path: String,
    pub tenant_cache_ttl_secs: u64,
    pub tenant_cache_negative_ttl_secs: u64,
    pub tenant_cache_max_entries: usize,

    // Admin API
    pub admin_api_token: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            server_name: env::var("SERVER_NAME").unwrap_or_else(|_| "localhost".to_string()),
            max_request_body_bytes: parse_or("MAX_REQUEST_BODY_BYTES", 1024 * 1024),

            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10),

            // Tenancy
            admin_api_prefix: path_var("ADMIN_API_PREFIX", DEFAULT_ADMIN_API_PREFIX)?,
            console_prefix: path_var("CONSOLE_PREFIX", DEFAULT_CONSOLE_PREFIX)?,
            team_list_path: path_var("TEAM_LIST_PATH", DEFAULT_TEAM_LIST_PATH)?,
            tenant_cache_ttl_secs: parse_or("TENANT_CACHE_TTL_SECS", 300),
            tenant_cache_negative_ttl_secs: parse_or("TENANT_CACHE_NEGATIVE_TTL_SECS", 30),
            tenant_cache_max_entries: parse_or("TENANT_CACHE_MAX_ENTRIES", 10_000),

            // Admin API
            admin_api_token: {
                let token = env::var("ADMIN_API_TOKEN")
                    .map_err(|_| ConfigError::Missing("ADMIN_API_TOKEN"))?;
                if token.len() < 32 {
                    return Err(ConfigError::WeakSecret(
                        "ADMIN_API_TOKEN must be at least 32 characters",
                    ));
                }
                token
            },
        })
    }

    pub fn exemption_policy(&self) -> PathExemptionPolicy {
        PathExemptionPolicy::new(
            self.admin_api_prefix.clone(),
            self.console_prefix.clone(),
            self.team_list_path.clone(),
        )
    }

    pub fn tenant_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.tenant_cache_ttl_secs)
    }

    pub fn tenant_cache_negative_ttl(&self) -> Duration {
        Duration::from_secs(self.tenant_cache_negative_ttl_secs)
    }
}

/// Parse a numeric variable, falling back to the default when unset or invalid
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read a path variable; paths must be absolute and not the root
fn path_var(key: &'static str, default: &str) -> Result<String, ConfigError> {
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    if !value.starts_with('/') || value.len() < 2 || value.ends_with('/') {
        return Err(ConfigError::InvalidPath(key));
    }
    Ok(value)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Weak secret: {0}")]
    WeakSecret(&'static str),
    #[error("{0} must start with '/', must not end with '/' and must not be the root")]
    InvalidPath(&'static str),
}
