//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use clientdesk_core::now_millis;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
            tracing::info!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE clients (
            id TEXT PRIMARY KEY,
            company_name TEXT NOT NULL,
            contact_email TEXT NOT NULL,
            contact_phone TEXT,
            industry TEXT,
            billing_address TEXT,
            assigned_team BLOB NOT NULL,      -- CBOR array of user ids
            status TEXT NOT NULL,
            created_at INTEGER NOT NULL       -- Unix ms
        );

        CREATE TABLE projects (
            id TEXT PRIMARY KEY,
            client_id TEXT NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT,
            status TEXT NOT NULL,
            start_date INTEGER,
            end_date INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- client_id is denormalized from the parent project
        CREATE TABLE services (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            client_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            status TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE tasks (
            id TEXT PRIMARY KEY,
            service_id TEXT NOT NULL REFERENCES services(id) ON DELETE CASCADE,
            client_id TEXT NOT NULL,
            title TEXT NOT NULL,
            status TEXT NOT NULL,
            client_visible INTEGER NOT NULL DEFAULT 0,
            comments BLOB NOT NULL,           -- CBOR array of comments
            created_at INTEGER NOT NULL
        );

        CREATE TABLE invoices (
            id TEXT PRIMARY KEY,
            client_id TEXT NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
            number TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            status TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE onboarding_checklists (
            client_id TEXT PRIMARY KEY REFERENCES clients(id) ON DELETE CASCADE,
            items BLOB NOT NULL,              -- CBOR array of checklist items
            status TEXT NOT NULL
        );

        CREATE TABLE activity_log (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            action TEXT NOT NULL,
            entity_kind TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            metadata TEXT NOT NULL,           -- JSON
            at INTEGER NOT NULL
        );

        CREATE INDEX idx_clients_status ON clients(status);
        CREATE INDEX idx_projects_client ON projects(client_id);
        CREATE INDEX idx_projects_updated ON projects(updated_at);
        CREATE INDEX idx_services_project ON services(project_id);
        CREATE INDEX idx_services_client ON services(client_id);
        CREATE INDEX idx_tasks_service ON tasks(service_id);
        CREATE INDEX idx_invoices_client ON invoices(client_id);
        CREATE INDEX idx_activity_entity ON activity_log(entity_id);
        "#,
    )?;

    Ok(())
}
