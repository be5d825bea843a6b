//! Paths and hosts that bypass tenant resolution

use super::resolver::is_admin_host;

/// Default administrative API root
pub const DEFAULT_ADMIN_API_PREFIX: &str = "/v1/admin";
/// Default infrastructure console root
pub const DEFAULT_CONSOLE_PREFIX: &str = "/h2-console";
/// Default team-listing endpoint
pub const DEFAULT_TEAM_LIST_PATH: &str = "/v1/team/list";

/// Decides whether a request skips tenant resolution entirely
#[derive(Debug, Clone)]
pub struct PathExemptionPolicy {
    admin_api_prefix: String,
    console_prefix: String,
    team_list_path: String,
}

impl Default for PathExemptionPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_ADMIN_API_PREFIX,
            DEFAULT_CONSOLE_PREFIX,
            DEFAULT_TEAM_LIST_PATH,
        )
    }
}

impl PathExemptionPolicy {
    pub fn new(
        admin_api_prefix: impl Into<String>,
        console_prefix: impl Into<String>,
        team_list_path: impl Into<String>,
    ) -> Self {
        Self {
            admin_api_prefix: admin_api_prefix.into(),
            console_prefix: console_prefix.into(),
            team_list_path: team_list_path.into(),
        }
    }

    /// True for admin API and console prefixes, the exact team-listing path,
    /// and any request addressed to the admin host.
    pub fn is_exempt(&self, path: &str, host: &str) -> bool {
        path.starts_with(&self.admin_api_prefix)
            || path.starts_with(&self.console_prefix)
            || path == self.team_list_path
            || is_admin_host(host)
    }
}
