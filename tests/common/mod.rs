//! Test utilities and fixtures for Rolegate integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use rusqlite::Connection;
use serde_json::Value;
use tower::ServiceExt;

pub use rolegate::db::{AppState, create_memory_pool, init_audit_db, init_db, queries};
pub use rolegate::fixture::{self, FixtureSet, RoleEntry, RoleIndex};
pub use rolegate::models::*;

pub fn assets_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("assets")
}

/// The shipped dataset, loaded once per test binary.
///
/// A missing or malformed fixture panics here, failing every test that uses it.
pub fn fixture() -> &'static FixtureSet {
    static FIXTURE: OnceLock<FixtureSet> = OnceLock::new();
    FIXTURE.get_or_init(|| FixtureSet::load(assets_dir()).expect("Failed to load fixture"))
}

pub fn role_index() -> &'static RoleIndex {
    static INDEX: OnceLock<RoleIndex> = OnceLock::new();
    INDEX.get_or_init(|| fixture().role_index())
}

/// The member at `position` under `role` in `org`, panicking with the lookup error.
pub fn member(org: i64, role: MembershipRole, position: usize) -> &'static RoleEntry {
    role_index()
        .member(org, role, position)
        .unwrap_or_else(|e| panic!("{}", e))
}

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create an in-memory test audit database with schema initialized
pub fn setup_test_audit_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory audit database");
    init_audit_db(&conn).expect("Failed to initialize audit schema");
    conn
}

/// A seeded application with one API key per fixture user.
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub keys: HashMap<String, String>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(false)
    }

    pub fn with_audit_log() -> Self {
        Self::build(true)
    }

    fn build(audit_log_enabled: bool) -> Self {
        let db = create_memory_pool().expect("Failed to create pool");
        let audit = create_memory_pool().expect("Failed to create audit pool");

        let keys = {
            let mut conn = db.get().unwrap();
            init_db(&conn).unwrap();
            fixture::seed(&mut conn, fixture()).expect("Failed to seed fixture")
        };
        {
            let conn = audit.get().unwrap();
            init_audit_db(&conn).unwrap();
        }

        let state = AppState {
            db,
            audit,
            audit_log_enabled,
        };
        let app = rolegate::app(state.clone());

        Self { app, state, keys }
    }

    pub fn key(&self, username: &str) -> &str {
        self.keys
            .get(username)
            .unwrap_or_else(|| panic!("no API key for {}", username))
    }

    pub async fn get(&self, username: &str, uri: &str) -> (StatusCode, Value) {
        self.send(username, "GET", uri, Body::empty()).await
    }

    pub async fn patch(&self, username: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(username, "PATCH", uri, Body::from(body.to_string()))
            .await
    }

    pub async fn delete(&self, username: &str, uri: &str) -> (StatusCode, Value) {
        self.send(username, "DELETE", uri, Body::empty()).await
    }

    async fn send(&self, username: &str, method: &str, uri: &str, body: Body) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {}", self.key(username)))
            .header("Content-Type", "application/json")
            .body(body)
            .unwrap();
        send_request(&self.app, request).await
    }
}

/// Send a request and decode the JSON body (`Value::Null` for an empty body).
pub async fn send_request(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
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

/// Assert a response's `results` hold exactly `expected`, compared as
/// structured values and ignoring order.
pub fn assert_same_records(body: &Value, expected: &[Membership]) {
    let actual = body["results"]
        .as_array()
        .unwrap_or_else(|| panic!("response has no results array: {}", body));

    let mut actual: Vec<String> = actual.iter().map(Value::to_string).collect();
    let mut expected: Vec<String> = expected
        .iter()
        .map(|m| serde_json::to_value(m).unwrap().to_string())
        .collect();
    actual.sort();
    expected.sort();

    assert_eq!(actual, expected);
}

/// The stored role of a membership, read directly from the database.
pub fn stored_role(state: &AppState, membership_id: i64) -> Option<MembershipRole> {
    let conn = state.db.get().unwrap();
    queries::get_membership_by_id(&conn, membership_id)
        .unwrap()
        .map(|m| m.role)
}
