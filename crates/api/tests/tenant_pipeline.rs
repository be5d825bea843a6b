//! Router-level tests for subdomain tenant resolution
//!
//! These run the full middleware pipeline against the in-memory team
//! repository, so no database is required.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use teamhub_api::{routes::create_router, AppState, Config};
use teamhub_shared::{InMemoryTeamRepository, NewTeam, StoreError, Team, TeamRepository, TeamUpdate};
use tower::ServiceExt;

const ADMIN_TOKEN: &str = "integration-admin-token-0123456789abcdef";

// ============================================================================
// Test Utilities
// ============================================================================

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".to_string(),
        server_name: "localhost".to_string(),
        max_request_body_bytes: 64 * 1024,
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        admin_api_prefix: "/v1/admin".to_string(),
        console_prefix: "/h2-console".to_string(),
        team_list_path: "/v1/team/list".to_string(),
        tenant_cache_ttl_secs: 300,
        tenant_cache_negative_ttl_secs: 300,
        tenant_cache_max_entries: 100,
        admin_api_token: ADMIN_TOKEN.to_string(),
    }
}

fn app_with(repo: Arc<dyn TeamRepository>) -> Router {
    create_router(AppState::new(test_config(), repo))
}

fn app() -> Router {
    app_with(Arc::new(InMemoryTeamRepository::with_teams([
        ("team-a", "Team A"),
        ("lions", "Lions"),
    ])))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(app: &Router, host: &str, path: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(path)
        .header("Host", host)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn admin(app: &Router, method: &str, host: &str, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(path)
        .header("Host", host)
        .header("Authorization", format!("Bearer {}", ADMIN_TOKEN))
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Always fails, like an unreachable database
struct BrokenRepository;

#[async_trait]
impl TeamRepository for BrokenRepository {
    async fn find_by_code(&self, _code: &str) -> Result<Option<Team>, StoreError> {
        Err(StoreError::Database("connection refused".to_string()))
    }
    async fn list_active(&self) -> Result<Vec<Team>, StoreError> {
        Err(StoreError::Database("connection refused".to_string()))
    }
    async fn create(&self, _team: NewTeam) -> Result<Team, StoreError> {
        Err(StoreError::Database("connection refused".to_string()))
    }
    async fn update(&self, _code: &str, _update: TeamUpdate) -> Result<Team, StoreError> {
        Err(StoreError::Database("connection refused".to_string()))
    }
    async fn soft_delete(&self, _code: &str) -> Result<Team, StoreError> {
        Err(StoreError::Database("connection refused".to_string()))
    }
    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Database("connection refused".to_string()))
    }
}

// ============================================================================
// Resolution
// ============================================================================

#[tokio::test]
async fn test_team_subdomain_resolves_team() {
    let app = app();

    let (status, body) = get(&app, "team-a.example.com", "/v1/team/info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "team-a");
    assert_eq!(body["name"], "Team A");
    assert!(body["created_at"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn test_host_case_is_ignored() {
    let app = app();

    let (status, body) = get(&app, "Team-A.Example.com", "/v1/team/info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "team-a");

    let (_, body) = get(&app, "TEAM-A.example.com", "/v1/team/context").await;
    assert_eq!(body["team_code"], "team-a");
    assert_eq!(body["resolution"], "resolved");
}

#[tokio::test]
async fn test_mixed_case_reserved_hosts_never_resolve() {
    let app = app();

    for host in ["WWW.example.com", "Api.example.com"] {
        let (status, body) = get(&app, host, "/v1/team/context").await;
        assert_eq!(status, StatusCode::OK, "host {}", host);
        assert_eq!(body["resolution"], "resolution_failed", "host {}", host);
        assert_eq!(body["team_code"], Value::Null);
    }

    let (_, body) = get(&app, "ADMIN.example.com", "/v1/team/context").await;
    assert_eq!(body["is_admin_request"], true);
    assert_eq!(body["resolution"], "exempt");
}

#[tokio::test]
async fn test_unknown_team_is_404_but_code_is_bound() {
    let app = app();

    let (status, body) = get(&app, "team-b.example.com", "/v1/team/info").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "TEAM_NOT_FOUND");

    let (status, body) = get(&app, "team-b.example.com", "/v1/team/context").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["team_code"], "team-b");
    assert_eq!(body["team"], Value::Null);
    assert_eq!(body["resolution"], "no_tenant");
}

#[tokio::test]
async fn test_port_is_stripped() {
    let app = app();

    let (status, with_port) = get(&app, "team-a.example.com:3000", "/v1/team/info").await;
    assert_eq!(status, StatusCode::OK);
    let (_, without_port) = get(&app, "team-a.example.com", "/v1/team/info").await;
    assert_eq!(with_port, without_port);
}

#[tokio::test]
async fn test_forwarded_host_takes_precedence() {
    let app = app();

    let request = Request::builder()
        .uri("/v1/team/context")
        .header("Host", "10.0.0.5:8080")
        .header("X-Forwarded-Host", "lions.example.com")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["host"], "lions.example.com");
    assert_eq!(body["team_code"], "lions");
    assert_eq!(body["resolution"], "resolved");
}

#[tokio::test]
async fn test_admin_host_skips_resolution() {
    let app = app();

    let (status, body) = get(&app, "admin.example.com", "/v1/team/context").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_admin_request"], true);
    assert_eq!(body["resolution"], "exempt");
    assert_eq!(body["team_code"], Value::Null);

    let (status, body) = get(&app, "admin.example.com", "/v1/team/info").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "NO_TEAM");
}

#[tokio::test]
async fn test_unresolvable_host_does_not_block_request() {
    let app = app();

    for host in ["localhost", "127.0.0.1", "foo", "www.example.com", "team_a.example.com"] {
        let (status, body) = get(&app, host, "/v1/team/context").await;
        assert_eq!(status, StatusCode::OK, "host {}", host);
        assert_eq!(body["resolution"], "resolution_failed", "host {}", host);
        assert_eq!(body["team_code"], Value::Null);
    }

    let (status, _) = get(&app, "localhost", "/health/live").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_tenant_required_endpoint_rejects_unresolvable_host() {
    let app = app();

    let (status, body) = get(&app, "localhost", "/v1/team/info").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_SUBDOMAIN");
}

#[tokio::test]
async fn test_explicit_code_endpoint() {
    let app = app();

    let (status, body) = get(&app, "team-a.example.com", "/v1/team/code").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "team_code": "team-a" }));

    // Resolves even when no team owns the code
    let (status, body) = get(&app, "nobody.example.com", "/v1/team/code").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["team_code"], "nobody");

    let (status, body) = get(&app, "192.168.0.1", "/v1/team/code").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_SUBDOMAIN");
}

// ============================================================================
// Exemptions
// ============================================================================

#[tokio::test]
async fn test_team_list_is_exempt() {
    let app = app();

    let (status, body) = get(&app, "localhost", "/v1/team/list").await;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["lions", "team-a"]);
}

#[tokio::test]
async fn test_admin_api_on_localhost_is_exempt() {
    let app = app();

    // No token: rejected by admin auth, never by tenant resolution
    let (status, body) = get(&app, "localhost", "/v1/admin/tenant-cache").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, body) = admin(&app, "GET", "localhost", "/v1/admin/tenant-cache", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_entries"], 0);
}

#[tokio::test]
async fn test_admin_token_is_checked() {
    let app = app();

    let request = Request::builder()
        .uri("/v1/admin/tenant-cache")
        .header("Host", "localhost")
        .header("Authorization", "Bearer wrong-token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Cache invalidation through the admin API
// ============================================================================

#[tokio::test]
async fn test_team_lifecycle_is_visible_immediately() {
    let app = app_with(Arc::new(InMemoryTeamRepository::new()));

    // Miss is cached
    let (status, _) = get(&app, "tigers.example.com", "/v1/team/info").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Create
    let (status, body) = admin(
        &app,
        "POST",
        "localhost",
        "/v1/admin/teams",
        json!({ "code": "tigers", "name": "Tigers" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["code"], "tigers");

    let (status, body) = get(&app, "tigers.example.com", "/v1/team/info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Tigers");

    // Rename
    let (status, _) = admin(
        &app,
        "PATCH",
        "localhost",
        "/v1/admin/teams/tigers",
        json!({ "code": "big-cats" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&app, "tigers.example.com", "/v1/team/info").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = get(&app, "big-cats.example.com", "/v1/team/info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Tigers");

    // Remove
    let (status, _) = admin(
        &app,
        "DELETE",
        "localhost",
        "/v1/admin/teams/big-cats",
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = get(&app, "big-cats.example.com", "/v1/team/info").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_rejects_invalid_team_codes() {
    let app = app();

    for code in ["www", "admin", "api", "ADMIN", "Www", "bad_code", "", "a.b"] {
        let (status, body) = admin(
            &app,
            "POST",
            "localhost",
            "/v1/admin/teams",
            json!({ "code": code, "name": "Whatever" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "code {:?}", code);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    let (status, body) = admin(
        &app,
        "POST",
        "localhost",
        "/v1/admin/teams",
        json!({ "code": "lions", "name": "Second Lions" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    // Same code in another case is the same subdomain
    let (status, _) = admin(
        &app,
        "POST",
        "localhost",
        "/v1/admin/teams",
        json!({ "code": "LIONS", "name": "Loud Lions" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_admin_stores_codes_lowercase() {
    let app = app_with(Arc::new(InMemoryTeamRepository::new()));

    let (status, body) = admin(
        &app,
        "POST",
        "localhost",
        "/v1/admin/teams",
        json!({ "code": " Tigers ", "name": "Tigers" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["code"], "tigers");

    let (status, _) = get(&app, "tigers.example.com", "/v1/team/info").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = admin(&app, "DELETE", "localhost", "/v1/admin/teams/TIGERS", Value::Null).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_cache_flush() {
    let app = app();

    get(&app, "team-a.example.com", "/v1/team/info").await;
    let (_, stats) = admin(&app, "GET", "localhost", "/v1/admin/tenant-cache", Value::Null).await;
    assert_eq!(stats["active_entries"], 1);

    let (status, _) = admin(&app, "POST", "localhost", "/v1/admin/tenant-cache/flush", Value::Null).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, stats) = admin(&app, "GET", "localhost", "/v1/admin/tenant-cache", Value::Null).await;
    assert_eq!(stats["total_entries"], 0);
}

// ============================================================================
// Storage failures
// ============================================================================

#[tokio::test]
async fn test_storage_failure_is_500_only_when_lookup_needed() {
    let app = app_with(Arc::new(BrokenRepository));

    let (status, body) = get(&app, "team-a.example.com", "/v1/team/context").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "DATABASE_ERROR");

    // No lookup happens for unresolvable hosts
    let (status, _) = get(&app, "localhost", "/v1/team/context").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&app, "localhost", "/health/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
