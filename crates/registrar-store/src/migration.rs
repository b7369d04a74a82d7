//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL
//! string that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    // Get current version
    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    // Apply migrations
    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_secs()],
            )?;
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
        -- The ordered ledger. `position` is the append order; it is the
        -- only meaningful ordering (timestamps are advisory).
        CREATE TABLE entries (
            position INTEGER PRIMARY KEY AUTOINCREMENT,
            chain_hash TEXT NOT NULL UNIQUE,   -- 64-char hex SHA-256
            prev_chain_hash TEXT NOT NULL,     -- hex or genesis sentinel
            proof_name TEXT NOT NULL,
            timestamp INTEGER NOT NULL,        -- unix seconds, advisory
            identity_fingerprint TEXT,         -- NULL until attached
            body TEXT NOT NULL                 -- full entry as JSON
        );

        -- Directly addressable registration records, one per fingerprint.
        CREATE TABLE registrations (
            fingerprint TEXT PRIMARY KEY,
            body TEXT NOT NULL,
            registered_at INTEGER NOT NULL
        );

        -- Proposals, keyed by truncated content hash. Not chained.
        CREATE TABLE proposals (
            proposal_id TEXT PRIMARY KEY,
            submitted_by TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            body TEXT NOT NULL
        );

        CREATE INDEX idx_entries_prev ON entries(prev_chain_hash);
        CREATE INDEX idx_entries_fingerprint ON entries(identity_fingerprint);
        CREATE INDEX idx_proposals_submitter ON proposals(submitted_by);
        "#,
    )?;

    Ok(())
}

/// Get current time in unix seconds.
fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"entries".to_string()));
        assert!(tables.contains(&"registrations".to_string()));
        assert!(tables.contains(&"proposals".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row(
                "SELECT MAX(version) FROM schema_migrations",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, 1);
    }
}
