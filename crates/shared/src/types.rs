//! Common types used across Teamhub

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// Teams
// =============================================================================

/// A tenant of the platform.
///
/// Every club ("team") owns its players, stadiums, matches and content, and is
/// addressed through the subdomain stored in `code`. Rows are never removed;
/// a deleted team keeps its row with `deleted = true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub id: Uuid,
    /// Subdomain label the team is reached under (e.g. `team-a`)
    pub code: String,
    /// Display name
    pub name: String,
    #[serde(skip_serializing)]
    pub deleted: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields required to register a team
#[derive(Debug, Clone, Deserialize)]
pub struct NewTeam {
    pub code: String,
    pub name: String,
}

/// Partial update of a team. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
}

impl TeamUpdate {
    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.name.is_none()
    }
}
