//! In-memory implementation of the ledger and cursor store.
//!
//! Same semantics as SQLite but nothing is persisted. It can also imitate a
//! remote ledger node: bundles can be made to appear only after a delay, and
//! a number of upcoming calls can be made to fail transiently.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use mam_core::{Address, ChannelCursor, ChannelId};
use tokio::time::Instant;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::traits::{AttachReceipt, AttachStatus, CursorStore, Ledger};
use crate::now_millis;

/// In-memory ledger. Thread-safe via RwLock.
pub struct MemoryLedger {
    inner: RwLock<MemoryLedgerInner>,
    visibility_delay: Duration,
    failing_attaches: AtomicU32,
    failing_lookups: AtomicU32,
}

#[derive(Default)]
struct MemoryLedgerInner {
    /// Bundles per address, in attach order.
    bundles: HashMap<Address, Vec<StoredBundle>>,

    /// Saved channel cursors.
    cursors: HashMap<ChannelId, ChannelCursor>,
}

struct StoredBundle {
    bundle: Bytes,
    visible_at: Instant,
}

impl MemoryLedger {
    /// Create an empty ledger where attached bundles are visible immediately.
    pub fn new() -> Self {
        Self::with_visibility_delay(Duration::ZERO)
    }

    /// Create an empty ledger where bundles become visible to
    /// [`Ledger::lookup`] only `delay` after they were attached.
    pub fn with_visibility_delay(delay: Duration) -> Self {
        Self {
            inner: RwLock::new(MemoryLedgerInner::default()),
            visibility_delay: delay,
            failing_attaches: AtomicU32::new(0),
            failing_lookups: AtomicU32::new(0),
        }
    }

    /// Make the next `count` attach calls fail with a transient error.
    pub fn fail_next_attaches(&self, count: u32) {
        self.failing_attaches.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` lookup calls fail with a transient error.
    pub fn fail_next_lookups(&self, count: u32) {
        self.failing_lookups.store(count, Ordering::SeqCst);
    }

    /// Total number of bundles stored, visible or not.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.bundles.values().map(Vec::len).sum())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryLedgerInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryLedgerInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Consume one injected failure, if any are pending.
fn take_failure(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn attach(&self, address: &Address, bundle: Bytes) -> Result<AttachReceipt> {
        if take_failure(&self.failing_attaches) {
            debug!(%address, "injected attach failure");
            return Err(StoreError::TransientFailure("ledger node unavailable".into()));
        }

        let mut inner = self.write()?;
        let stored = inner.bundles.entry(*address).or_default();

        let status = if stored.iter().any(|s| s.bundle == bundle) {
            AttachStatus::AlreadyAttached
        } else {
            stored.push(StoredBundle {
                bundle,
                visible_at: Instant::now() + self.visibility_delay,
            });
            AttachStatus::Attached
        };

        Ok(AttachReceipt {
            address: *address,
            status,
            bundles_at_address: stored.len(),
            attached_at: now_millis(),
        })
    }

    async fn lookup(&self, address: &Address) -> Result<Vec<Bytes>> {
        if take_failure(&self.failing_lookups) {
            debug!(%address, "injected lookup failure");
            return Err(StoreError::TransientFailure("ledger node unavailable".into()));
        }

        let inner = self.read()?;
        let now = Instant::now();
        Ok(inner
            .bundles
            .get(address)
            .map(|stored| {
                stored
                    .iter()
                    .filter(|s| s.visible_at <= now)
                    .map(|s| s.bundle.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl CursorStore for MemoryLedger {
    async fn save_cursor(&self, cursor: &ChannelCursor) -> Result<()> {
        let mut inner = self.write()?;
        inner.cursors.insert(cursor.channel_id, cursor.clone());
        Ok(())
    }

    async fn load_cursor(&self, channel_id: &ChannelId) -> Result<Option<ChannelCursor>> {
        let inner = self.read()?;
        Ok(inner.cursors.get(channel_id).cloned())
    }
}
