use chrono::Utc;
use rusqlite::{Connection, ToSql, params, types::Value};
use uuid::Uuid;

use crate::crypto::{generate_api_key, hash_secret, key_prefix};
use crate::error::Result;
use crate::models::*;
use crate::pagination::Window;

use super::from_row::{
    API_KEY_COLS, AUDIT_LOG_COLS, MEMBERSHIP_COLS, MEMBERSHIP_FROM, ORGANIZATION_COLS, USER_COLS,
    query_all, query_one,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

/// Builder for dynamic UPDATE statements.
struct UpdateBuilder {
    table: &'static str,
    id: Value,
    fields: Vec<(&'static str, Value)>,
    track_updated_at: bool,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: impl Into<Value>) -> Self {
        Self {
            table,
            id: id.into(),
            fields: Vec::new(),
            track_updated_at: false,
        }
    }

    fn with_updated_at(mut self) -> Self {
        self.track_updated_at = true;
        self
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn execute(mut self, conn: &Connection) -> Result<bool> {
        if self.fields.is_empty() {
            return Ok(false);
        }
        if self.track_updated_at {
            self.fields.push(("updated_at", now().into()));
        }
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id);
        let sql = format!("UPDATE {} SET {} WHERE id = ?", self.table, sets.join(", "));
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(affected > 0)
    }
}

// ============ Users ============

/// Insert a user with a caller-chosen id (ids come from seed data).
pub fn create_user(conn: &Connection, user: &User) -> Result<User> {
    conn.execute(
        "INSERT INTO users (id, username, first_name, last_name, is_superuser, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.id,
            &user.username,
            &user.first_name,
            &user.last_name,
            user.is_superuser,
            now()
        ],
    )?;
    Ok(user.clone())
}

pub fn get_user_by_id(conn: &Connection, id: i64) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

pub fn get_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE username = ?1", USER_COLS),
        &[&username],
    )
}

// ============ API Keys ============

/// Issue a new API key for a user. Returns the stored record and the full key,
/// which is not recoverable afterwards.
pub fn create_api_key(conn: &Connection, user_id: i64) -> Result<(ApiKey, String)> {
    let key = generate_api_key();
    let record = ApiKey {
        id: gen_id(),
        user_id,
        prefix: key_prefix(&key),
        key_hash: hash_secret(&key),
        created_at: now(),
        last_used_at: None,
        revoked_at: None,
    };

    conn.execute(
        "INSERT INTO api_keys (id, user_id, key_prefix, key_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            &record.id,
            record.user_id,
            &record.prefix,
            &record.key_hash,
            record.created_at
        ],
    )?;

    Ok((record, key))
}

/// Resolve a presented API key to its user. Revoked keys do not resolve.
pub fn get_user_by_api_key(conn: &Connection, api_key: &str) -> Result<Option<(User, ApiKey)>> {
    let hash = hash_secret(api_key);

    let key: Option<ApiKey> = query_one(
        conn,
        &format!(
            "SELECT {} FROM api_keys WHERE key_hash = ?1 AND revoked_at IS NULL",
            API_KEY_COLS
        ),
        &[&hash],
    )?;

    let Some(key) = key else {
        return Ok(None);
    };

    // Usage tracking must not fail authentication
    if let Err(e) = conn.execute(
        "UPDATE api_keys SET last_used_at = ?1 WHERE id = ?2",
        params![now(), &key.id],
    ) {
        tracing::warn!("Failed to record API key usage for {}: {}", key.prefix, e);
    }

    Ok(get_user_by_id(conn, key.user_id)?.map(|user| (user, key)))
}

pub fn revoke_api_key(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE api_keys SET revoked_at = ?1 WHERE id = ?2 AND revoked_at IS NULL",
        params![now(), id],
    )?;
    Ok(affected > 0)
}

// ============ Organizations ============

pub fn create_organization(conn: &Connection, org: &Organization) -> Result<Organization> {
    conn.execute(
        "INSERT INTO organizations (id, slug, name, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![org.id, &org.slug, &org.name, now()],
    )?;
    Ok(org.clone())
}

pub fn get_organization_by_id(conn: &Connection, id: i64) -> Result<Option<Organization>> {
    query_one(
        conn,
        &format!("SELECT {} FROM organizations WHERE id = ?1", ORGANIZATION_COLS),
        &[&id],
    )
}

// ============ Memberships ============

/// Restricts a membership listing. Unset fields do not filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct MembershipFilter {
    pub org_id: Option<i64>,
    pub user_id: Option<i64>,
    pub role: Option<MembershipRole>,
}

impl MembershipFilter {
    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut conditions = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(org_id) = self.org_id {
            conditions.push("m.org_id = ?");
            values.push(org_id.into());
        }
        if let Some(user_id) = self.user_id {
            conditions.push("m.user_id = ?");
            values.push(user_id.into());
        }
        if let Some(role) = self.role {
            conditions.push("m.role = ?");
            values.push(role.as_ref().to_string().into());
        }

        if conditions.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", conditions.join(" AND ")), values)
        }
    }
}

/// Insert a membership with a caller-chosen id. The embedded user must exist.
pub fn create_membership(conn: &Connection, membership: &Membership) -> Result<Membership> {
    conn.execute(
        "INSERT INTO memberships (id, user_id, org_id, role, is_active, joined_date, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            membership.id,
            membership.user.id,
            membership.organization,
            membership.role.as_ref(),
            membership.is_active,
            &membership.joined_date,
            now()
        ],
    )?;
    Ok(membership.clone())
}

pub fn get_membership_by_id(conn: &Connection, id: i64) -> Result<Option<Membership>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM {} WHERE m.id = ?1",
            MEMBERSHIP_COLS, MEMBERSHIP_FROM
        ),
        &[&id],
    )
}

/// The user's membership in an organization, if it is active.
pub fn get_active_membership(
    conn: &Connection,
    user_id: i64,
    org_id: i64,
) -> Result<Option<Membership>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM {} WHERE m.user_id = ?1 AND m.org_id = ?2 AND m.is_active = 1",
            MEMBERSHIP_COLS, MEMBERSHIP_FROM
        ),
        params![user_id, org_id],
    )
}

/// List memberships ordered by id, with the total count before paging.
pub fn list_memberships_paginated(
    conn: &Connection,
    filter: &MembershipFilter,
    window: Window,
) -> Result<(Vec<Membership>, i64)> {
    let (where_clause, mut values) = filter.where_clause();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}{}", MEMBERSHIP_FROM, where_clause),
        rusqlite::params_from_iter(values.iter()),
        |row| row.get(0),
    )?;

    values.push(window.limit.into());
    values.push(window.offset.into());
    let params: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();

    let items = query_all(
        conn,
        &format!(
            "SELECT {} FROM {}{} ORDER BY m.id LIMIT ? OFFSET ?",
            MEMBERSHIP_COLS, MEMBERSHIP_FROM, where_clause
        ),
        &params,
    )?;

    Ok((items, total))
}

/// Set a membership's role. Returns the updated membership, or None if not found.
pub fn update_membership_role(
    conn: &Connection,
    id: i64,
    role: MembershipRole,
) -> Result<Option<Membership>> {
    let updated = UpdateBuilder::new("memberships", id)
        .with_updated_at()
        .set("role", role.as_ref().to_string())
        .execute(conn)?;

    if !updated {
        return Ok(None);
    }
    get_membership_by_id(conn, id)
}

pub fn delete_membership(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM memberships WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

// ============ Audit Logs ============

/// Write an audit log entry. When logging is disabled the entry is built and
/// returned but not stored.
#[allow(clippy::too_many_arguments)]
pub fn create_audit_log(
    conn: &Connection,
    enabled: bool,
    actor_type: ActorType,
    user_id: Option<i64>,
    username: Option<&str>,
    action: &str,
    resource_type: &str,
    resource_id: &str,
    details: Option<&serde_json::Value>,
    org_id: Option<i64>,
    ip_address: Option<&str>,
    user_agent: Option<&str>,
    auth_credential: Option<&str>,
) -> Result<AuditLog> {
    let entry = AuditLog {
        id: gen_id(),
        timestamp: now(),
        actor_type,
        user_id,
        username: username.map(String::from),
        action: action.to_string(),
        resource_type: resource_type.to_string(),
        resource_id: resource_id.to_string(),
        details: details.cloned(),
        org_id,
        ip_address: ip_address.map(String::from),
        user_agent: user_agent.map(String::from),
        auth_credential: auth_credential.map(String::from),
    };

    if !enabled {
        return Ok(entry);
    }

    let details_str = entry.details.as_ref().map(|d| d.to_string());

    conn.execute(
        "INSERT INTO audit_logs (id, timestamp, actor_type, user_id, username, action, resource_type, resource_id, details, org_id, ip_address, user_agent, auth_credential)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            &entry.id,
            entry.timestamp,
            entry.actor_type.as_ref(),
            entry.user_id,
            &entry.username,
            &entry.action,
            &entry.resource_type,
            &entry.resource_id,
            details_str,
            entry.org_id,
            &entry.ip_address,
            &entry.user_agent,
            &entry.auth_credential,
        ],
    )?;

    Ok(entry)
}

/// Audit entries for one resource, oldest first.
pub fn list_audit_logs_for_resource(
    conn: &Connection,
    resource_type: &str,
    resource_id: &str,
) -> Result<Vec<AuditLog>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM audit_logs WHERE resource_type = ?1 AND resource_id = ?2 ORDER BY timestamp, rowid",
            AUDIT_LOG_COLS
        ),
        params![resource_type, resource_id],
    )
}
