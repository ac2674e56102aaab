//! Request helpers and the audit log builder.

use axum::http::HeaderMap;
use rusqlite::Connection;

use crate::db::queries;
use crate::error::Result;
use crate::models::{ActorType, AuditAction, AuditLog};

/// Extract client IP address and user-agent from request headers.
///
/// Tries `x-forwarded-for` first (for proxied requests), then `x-real-ip`.
pub fn extract_request_info(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip = headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    (ip, user_agent)
}

/// The token from an `Authorization: Bearer <token>` header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Fluent construction of audit log entries.
///
/// ```ignore
/// AuditLogBuilder::new(&audit_conn, state.audit_log_enabled, &headers)
///     .actor(ActorType::User, Some(ctx.user.id), Some(&ctx.user.username))
///     .action(AuditAction::UpdateMembership)
///     .resource("membership", &membership.id.to_string())
///     .org(membership.organization)
///     .save()?;
/// ```
pub struct AuditLogBuilder<'a> {
    conn: &'a Connection,
    enabled: bool,
    headers: &'a HeaderMap,
    actor_type: ActorType,
    user_id: Option<i64>,
    username: Option<&'a str>,
    action: Option<AuditAction>,
    resource_type: &'a str,
    resource_id: &'a str,
    details: Option<&'a serde_json::Value>,
    org_id: Option<i64>,
    auth_credential: Option<&'a str>,
}

impl<'a> AuditLogBuilder<'a> {
    pub fn new(conn: &'a Connection, enabled: bool, headers: &'a HeaderMap) -> Self {
        Self {
            conn,
            enabled,
            headers,
            actor_type: ActorType::System,
            user_id: None,
            username: None,
            action: None,
            resource_type: "",
            resource_id: "",
            details: None,
            org_id: None,
            auth_credential: None,
        }
    }

    pub fn actor(
        mut self,
        actor_type: ActorType,
        user_id: Option<i64>,
        username: Option<&'a str>,
    ) -> Self {
        self.actor_type = actor_type;
        self.user_id = user_id;
        self.username = username;
        self
    }

    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn resource(mut self, resource_type: &'a str, resource_id: &'a str) -> Self {
        self.resource_type = resource_type;
        self.resource_id = resource_id;
        self
    }

    pub fn details(mut self, details: &'a serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn org(mut self, org_id: i64) -> Self {
        self.org_id = Some(org_id);
        self
    }

    /// Record the visible prefix of the API key that authenticated the request.
    pub fn auth_credential(mut self, key_prefix: &'a str) -> Self {
        self.auth_credential = Some(key_prefix);
        self
    }

    pub fn save(self) -> Result<AuditLog> {
        let action = self.action.ok_or_else(|| {
            crate::error::AppError::Internal("audit log entry built without an action".into())
        })?;
        let (ip, ua) = extract_request_info(self.headers);
        queries::create_audit_log(
            self.conn,
            self.enabled,
            self.actor_type,
            self.user_id,
            self.username,
            action.as_ref(),
            self.resource_type,
            self.resource_id,
            self.details,
            self.org_id,
            ip.as_deref(),
            ua.as_deref(),
            self.auth_credential,
        )
    }
}
