use rusqlite::Connection;

/// Initialize the main database schema (everything except audit logs)
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Users (identity; superusers administer every organization)
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            is_superuser INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );

        -- API keys (the only credential; one user may hold several)
        CREATE TABLE IF NOT EXISTS api_keys (
            id TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            key_prefix TEXT NOT NULL,
            key_hash TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL,
            last_used_at INTEGER,
            revoked_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_api_keys_user ON api_keys(user_id);

        CREATE TABLE IF NOT EXISTS organizations (
            id INTEGER PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        -- Memberships (a user's role within one organization)
        -- joined_date is kept verbatim as supplied; NULL for pending memberships
        CREATE TABLE IF NOT EXISTS memberships (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            org_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
            role TEXT NOT NULL CHECK (role IN ('worker', 'supervisor', 'maintainer', 'owner')),
            is_active INTEGER NOT NULL DEFAULT 1,
            joined_date TEXT,
            updated_at INTEGER NOT NULL,
            UNIQUE(user_id, org_id)
        );
        CREATE INDEX IF NOT EXISTS idx_memberships_org ON memberships(org_id);
        CREATE INDEX IF NOT EXISTS idx_memberships_user ON memberships(user_id);
        "#,
    )?;
    Ok(())
}

/// Initialize the audit log database schema (separate DB file)
pub fn init_audit_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS audit_logs (
            id TEXT PRIMARY KEY,
            timestamp INTEGER NOT NULL,
            actor_type TEXT NOT NULL CHECK (actor_type IN ('user', 'system')),
            user_id INTEGER,                      -- references users.id (null for system)
            username TEXT,                        -- denormalized for display
            action TEXT NOT NULL,
            resource_type TEXT NOT NULL,
            resource_id TEXT NOT NULL,
            details TEXT,
            org_id INTEGER,
            ip_address TEXT,
            user_agent TEXT,
            auth_credential TEXT                  -- key prefix (e.g. 'rg_a1b2c3d4')
        );
        CREATE INDEX IF NOT EXISTS idx_audit_logs_timestamp ON audit_logs(timestamp);
        CREATE INDEX IF NOT EXISTS idx_audit_logs_resource ON audit_logs(resource_type, resource_id);
        CREATE INDEX IF NOT EXISTS idx_audit_logs_org_time ON audit_logs(org_id, timestamp DESC);
        "#,
    )?;
    Ok(())
}
