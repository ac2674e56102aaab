//! Rolegate - role-based membership management for organizations
//!
//! Users belong to organizations with one of four ranked roles. The HTTP API
//! lists, reads, re-roles and removes memberships, and every mutation is
//! checked against the caller's own rank before it is applied.

pub mod authz;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod extractors;
pub mod fixture;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod util;

use axum::Router;
use tower_http::trace::TraceLayer;

use db::AppState;

/// The full application with request tracing, ready to serve.
pub fn app(state: AppState) -> Router {
    handlers::router(state.clone())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
