//! SQLite implementation of the ledger and cursor store.
//!
//! A local, persistent stand-in for a ledger node. Uses rusqlite with
//! bundled SQLite, wrapped in async via `tokio::task::spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use mam_core::{Address, Blake3Hash, ChannelCursor, ChannelId, Mode, SecurityLevel, SideKey};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::now_millis;
use crate::traits::{AttachReceipt, AttachStatus, CursorStore, Ledger};

/// SQLite-backed ledger.
///
/// Thread-safe via internal Mutex. All operations run on the blocking pool.
#[derive(Clone)]
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedger {
    /// Open a SQLite database at the given path, creating and migrating it
    /// if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

fn blob_32(bytes: Vec<u8>, column: &str) -> Result<[u8; 32]> {
    bytes
        .try_into()
        .map_err(|v: Vec<u8>| StoreError::InvalidData(format!("{} has {} bytes", column, v.len())))
}

fn row_to_cursor(
    channel_id: Vec<u8>,
    position: i64,
    mode: String,
    security: u8,
    side_key: Option<String>,
) -> Result<ChannelCursor> {
    let mode: Mode = mode
        .parse()
        .map_err(|e| StoreError::InvalidData(format!("cursor mode: {}", e)))?;
    let security = SecurityLevel::from_u8(security)
        .map_err(|e| StoreError::InvalidData(format!("cursor security: {}", e)))?;
    let side_key = side_key
        .map(|s| SideKey::new(&s))
        .transpose()
        .map_err(|e| StoreError::InvalidData(format!("cursor side key: {}", e)))?;

    Ok(ChannelCursor {
        channel_id: ChannelId::from_bytes(blob_32(channel_id, "channel_id")?),
        position: u64::try_from(position)
            .map_err(|_| StoreError::InvalidData(format!("negative position {}", position)))?,
        mode,
        security,
        side_key,
    })
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn attach(&self, address: &Address, bundle: Bytes) -> Result<AttachReceipt> {
        let address = *address;
        let receipt = self
            .blocking(move |conn| {
                let hash = Blake3Hash::hash(&bundle);
                let now = now_millis();
                let tx = conn.transaction()?;

                let existing: Option<i64> = tx
                    .query_row(
                        "SELECT seq FROM bundles WHERE address = ?1 AND bundle_hash = ?2",
                        params![address.0.as_slice(), hash.0.as_slice()],
                        |row| row.get(0),
                    )
                    .optional()?;

                let count: i64 = tx.query_row(
                    "SELECT COUNT(*) FROM bundles WHERE address = ?1",
                    params![address.0.as_slice()],
                    |row| row.get(0),
                )?;

                let (status, total) = match existing {
                    Some(_) => (AttachStatus::AlreadyAttached, count),
                    None => {
                        tx.execute(
                            "INSERT INTO bundles (address, seq, bundle, bundle_hash, attached_at)
                             VALUES (?1, ?2, ?3, ?4, ?5)",
                            params![
                                address.0.as_slice(),
                                count,
                                bundle.as_ref(),
                                hash.0.as_slice(),
                                now,
                            ],
                        )?;
                        (AttachStatus::Attached, count + 1)
                    }
                };
                tx.commit()?;

                Ok(AttachReceipt {
                    address,
                    status,
                    bundles_at_address: total as usize,
                    attached_at: now,
                })
            })
            .await?;

        debug!(address = %receipt.address, status = ?receipt.status, "attached bundle");
        Ok(receipt)
    }

    async fn lookup(&self, address: &Address) -> Result<Vec<Bytes>> {
        let address = *address;
        self.blocking(move |conn| {
            let mut stmt =
                conn.prepare("SELECT bundle FROM bundles WHERE address = ?1 ORDER BY seq")?;
            let bundles = stmt
                .query_map(params![address.0.as_slice()], |row| {
                    row.get::<_, Vec<u8>>(0)
                })?
                .map(|r| r.map(Bytes::from))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(bundles)
        })
        .await
    }
}

#[async_trait]
impl CursorStore for SqliteLedger {
    async fn save_cursor(&self, cursor: &ChannelCursor) -> Result<()> {
        let cursor = cursor.clone();
        let position = i64::try_from(cursor.position).map_err(|_| {
            StoreError::InvalidData(format!(
                "position {} does not fit a cursor row",
                cursor.position
            ))
        })?;
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO channel_cursors
                    (channel_id, position, mode, security, side_key, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(channel_id) DO UPDATE SET
                    position = excluded.position,
                    mode = excluded.mode,
                    security = excluded.security,
                    side_key = excluded.side_key,
                    updated_at = excluded.updated_at",
                params![
                    cursor.channel_id.0.as_slice(),
                    position,
                    cursor.mode.as_str(),
                    cursor.security.to_u8(),
                    cursor.side_key.map(String::from),
                    now_millis(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn load_cursor(&self, channel_id: &ChannelId) -> Result<Option<ChannelCursor>> {
        let channel_id = *channel_id;
        self.blocking(move |conn| {
            let row = conn
                .query_row(
                    "SELECT channel_id, position, mode, security, side_key
                     FROM channel_cursors WHERE channel_id = ?1",
                    params![channel_id.0.as_slice()],
                    |row| {
                        Ok((
                            row.get::<_, Vec<u8>>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, u8>(3)?,
                            row.get::<_, Option<String>>(4)?,
                        ))
                    },
                )
                .optional()?;

            row.map(|(id, position, mode, security, side_key)| {
                row_to_cursor(id, position, mode, security, side_key)
            })
            .transpose()
        })
        .await
    }
}
