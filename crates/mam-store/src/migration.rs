//! Database schema migrations for SQLite.
//!
//! Each migration is a SQL batch that moves the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::now_millis;

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema. Idempotent.
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
        }

        tx.commit()?;
        tracing::debug!(from = current, to = CURRENT_VERSION, "migrated ledger schema");
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: bundles and channel cursors.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Bundles attached to the ledger
        CREATE TABLE bundles (
            address BLOB NOT NULL,            -- 32 bytes
            seq INTEGER NOT NULL,             -- attach order within the address
            bundle BLOB NOT NULL,             -- encoded message bytes
            bundle_hash BLOB NOT NULL,        -- 32 bytes, Blake3 of bundle
            attached_at INTEGER NOT NULL,     -- Unix ms

            PRIMARY KEY (address, seq),
            UNIQUE (address, bundle_hash)
        );

        -- Resumption cursors, keyed by one-way channel id
        CREATE TABLE channel_cursors (
            channel_id BLOB PRIMARY KEY,      -- 32 bytes
            position INTEGER NOT NULL,
            mode TEXT NOT NULL,               -- public | private | restricted
            security INTEGER NOT NULL,        -- 1..=3
            side_key TEXT,                    -- present iff mode = restricted
            updated_at INTEGER NOT NULL
        );

        CREATE INDEX idx_bundles_attached ON bundles(attached_at);
        "#,
    )?;

    Ok(())
}
