//! Row mapping for query results.
//!
//! Models implement `FromRow`; `query_one` and `query_all` run a statement and
//! map its rows. Each `*_COLS` constant lists columns in the order the matching
//! `FromRow` impl reads them.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to rusqlite errors.
///
/// A row holding an unknown enum value surfaces as an error instead of a panic.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const USER_COLS: &str = "id, username, first_name, last_name, is_superuser";

pub const ORGANIZATION_COLS: &str = "id, slug, name";

pub const API_KEY_COLS: &str =
    "id, user_id, key_prefix, key_hash, created_at, last_used_at, revoked_at";

/// Memberships are always read joined with their user (`m` and `u` aliases).
pub const MEMBERSHIP_COLS: &str = "m.id, m.org_id, m.is_active, m.joined_date, m.role, u.id, u.username, u.first_name, u.last_name";

pub const MEMBERSHIP_FROM: &str = "memberships m JOIN users u ON m.user_id = u.id";

pub const AUDIT_LOG_COLS: &str = "id, timestamp, actor_type, user_id, username, action, resource_type, resource_id, details, org_id, ip_address, user_agent, auth_credential";

// ============ FromRow Implementations ============

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            is_superuser: row.get(4)?,
        })
    }
}

impl FromRow for Organization {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Organization {
            id: row.get(0)?,
            slug: row.get(1)?,
            name: row.get(2)?,
        })
    }
}

impl FromRow for ApiKey {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ApiKey {
            id: row.get(0)?,
            user_id: row.get(1)?,
            prefix: row.get(2)?,
            key_hash: row.get(3)?,
            created_at: row.get(4)?,
            last_used_at: row.get(5)?,
            revoked_at: row.get(6)?,
        })
    }
}

impl FromRow for Membership {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Membership {
            id: row.get(0)?,
            organization: row.get(1)?,
            is_active: row.get(2)?,
            joined_date: row.get(3)?,
            role: parse_enum(row, 4, "role")?,
            user: MembershipUser {
                id: row.get(5)?,
                username: row.get(6)?,
                first_name: row.get(7)?,
                last_name: row.get(8)?,
            },
        })
    }
}

impl FromRow for AuditLog {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let details: Option<String> = row.get(8)?;
        Ok(AuditLog {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            actor_type: parse_enum(row, 2, "actor_type")?,
            user_id: row.get(3)?,
            username: row.get(4)?,
            action: row.get(5)?,
            resource_type: row.get(6)?,
            resource_id: row.get(7)?,
            details: details.and_then(|d| match serde_json::from_str(&d) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("Unreadable details on audit log entry: {}", e);
                    None
                }
            }),
            org_id: row.get(9)?,
            ip_address: row.get(10)?,
            user_agent: row.get(11)?,
            auth_credential: row.get(12)?,
        })
    }
}
