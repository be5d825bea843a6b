//! Team persistence
//!
//! `TeamRepository` is the seam between the tenant-resolution layer and
//! storage. The Postgres implementation backs production; the in-memory one
//! backs tests and local runs without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{is_unique_violation, StoreError};
use crate::types::{NewTeam, Team, TeamUpdate};

/// Storage operations on teams. Deleted teams are invisible to every method.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Find an active team by its subdomain code
    async fn find_by_code(&self, code: &str) -> Result<Option<Team>, StoreError>;

    /// List all active teams ordered by name
    async fn list_active(&self) -> Result<Vec<Team>, StoreError>;

    /// Register a new team
    async fn create(&self, team: NewTeam) -> Result<Team, StoreError>;

    /// Change the code and/or name of an active team
    async fn update(&self, code: &str, update: TeamUpdate) -> Result<Team, StoreError>;

    /// Soft-delete an active team
    async fn soft_delete(&self, code: &str) -> Result<Team, StoreError>;

    /// Check that storage is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}

// =============================================================================
// Postgres
// =============================================================================

const TEAM_COLUMNS: &str = "id, code, name, deleted, created_at, updated_at";

/// Postgres-backed team repository
#[derive(Clone)]
pub struct PgTeamRepository {
    pool: PgPool,
}

impl PgTeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamRepository for PgTeamRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Team>, StoreError> {
        let team: Option<Team> = sqlx::query_as(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE code = $1 AND deleted = FALSE"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(team)
    }

    async fn list_active(&self) -> Result<Vec<Team>, StoreError> {
        let teams: Vec<Team> = sqlx::query_as(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE deleted = FALSE ORDER BY name, code"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(teams)
    }

    async fn create(&self, team: NewTeam) -> Result<Team, StoreError> {
        let result: Result<Team, sqlx::Error> = sqlx::query_as(&format!(
            r#"
            INSERT INTO teams (id, code, name, deleted, created_at, updated_at)
            VALUES ($1, $2, $3, FALSE, NOW(), NOW())
            RETURNING {TEAM_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&team.code)
        .bind(&team.name)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(e) if is_unique_violation(&e) => Err(StoreError::CodeTaken(team.code)),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, code: &str, update: TeamUpdate) -> Result<Team, StoreError> {
        let new_code = update.code.clone();
        let result: Result<Option<Team>, sqlx::Error> = sqlx::query_as(&format!(
            r#"
            UPDATE teams
            SET code = COALESCE($2, code),
                name = COALESCE($3, name),
                updated_at = NOW()
            WHERE code = $1 AND deleted = FALSE
            RETURNING {TEAM_COLUMNS}
            "#
        ))
        .bind(code)
        .bind(update.code)
        .bind(update.name)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(team)) => Ok(team),
            Ok(None) => Err(StoreError::NotFound(code.to_string())),
            Err(e) if is_unique_violation(&e) => Err(StoreError::CodeTaken(
                new_code.unwrap_or_else(|| code.to_string()),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn soft_delete(&self, code: &str) -> Result<Team, StoreError> {
        let team: Option<Team> = sqlx::query_as(&format!(
            r#"
            UPDATE teams
            SET deleted = TRUE, updated_at = NOW()
            WHERE code = $1 AND deleted = FALSE
            RETURNING {TEAM_COLUMNS}
            "#
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        team.ok_or_else(|| StoreError::NotFound(code.to_string()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// In-memory team repository keyed by team id
#[derive(Default)]
pub struct InMemoryTeamRepository {
    teams: RwLock<HashMap<Uuid, Team>>,
}

impl InMemoryTeamRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository pre-populated with `(code, name)` pairs
    pub fn with_teams<'a>(teams: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let now = OffsetDateTime::now_utc();
        let teams = teams
            .into_iter()
            .map(|(code, name)| {
                let id = Uuid::new_v4();
                let team = Team {
                    id,
                    code: code.to_string(),
                    name: name.to_string(),
                    deleted: false,
                    created_at: now,
                    updated_at: now,
                };
                (id, team)
            })
            .collect();

        Self {
            teams: RwLock::new(teams),
        }
    }
}

fn find_active<'a>(teams: &'a HashMap<Uuid, Team>, code: &str) -> Option<&'a Team> {
    teams.values().find(|t| !t.deleted && t.code == code)
}

#[async_trait]
impl TeamRepository for InMemoryTeamRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Team>, StoreError> {
        let teams = self.teams.read().await;
        Ok(find_active(&teams, code).cloned())
    }

    async fn list_active(&self) -> Result<Vec<Team>, StoreError> {
        let teams = self.teams.read().await;
        let mut active: Vec<Team> = teams.values().filter(|t| !t.deleted).cloned().collect();
        active.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.code.cmp(&b.code)));
        Ok(active)
    }

    async fn create(&self, team: NewTeam) -> Result<Team, StoreError> {
        let mut teams = self.teams.write().await;
        if find_active(&teams, &team.code).is_some() {
            return Err(StoreError::CodeTaken(team.code));
        }

        let now = OffsetDateTime::now_utc();
        let created = Team {
            id: Uuid::new_v4(),
            code: team.code,
            name: team.name,
            deleted: false,
            created_at: now,
            updated_at: now,
        };
        teams.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, code: &str, update: TeamUpdate) -> Result<Team, StoreError> {
        let mut teams = self.teams.write().await;
        let id = find_active(&teams, code)
            .map(|t| t.id)
            .ok_or_else(|| StoreError::NotFound(code.to_string()))?;

        if let Some(new_code) = &update.code {
            if new_code != code && find_active(&teams, new_code).is_some() {
                return Err(StoreError::CodeTaken(new_code.clone()));
            }
        }

        let team = teams
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(code.to_string()))?;
        if let Some(new_code) = update.code {
            team.code = new_code;
        }
        if let Some(name) = update.name {
            team.name = name;
        }
        team.updated_at = OffsetDateTime::now_utc();
        Ok(team.clone())
    }

    async fn soft_delete(&self, code: &str) -> Result<Team, StoreError> {
        let mut teams = self.teams.write().await;
        let id = find_active(&teams, code)
            .map(|t| t.id)
            .ok_or_else(|| StoreError::NotFound(code.to_string()))?;

        let team = teams
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(code.to_string()))?;
        team.deleted = true;
        team.updated_at = OffsetDateTime::now_utc();
        Ok(team.clone())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
