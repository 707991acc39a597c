//! Ledger and cursor store traits.
//!
//! [`Ledger`] is the contract a channel needs from the immutable ledger it
//! publishes to: attach bytes at an address, and look up everything attached
//! at an address. Implementations include SQLite (local, persistent) and
//! in-memory (tests, with injectable latency and failures).

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use mam_core::{Address, ChannelCursor, ChannelId};

use crate::error::Result;

/// Outcome of attaching a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachStatus {
    /// The bundle was stored.
    Attached,
    /// The exact bundle was already stored at this address (idempotent, not an error).
    AlreadyAttached,
}

/// Confirmation handle returned by [`Ledger::attach`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachReceipt {
    pub address: Address,
    pub status: AttachStatus,
    /// Number of bundles stored at the address after this call.
    pub bundles_at_address: usize,
    /// When the ledger accepted the bundle (Unix ms).
    pub attached_at: i64,
}

/// The ledger collaborator.
///
/// Both calls may be slow and may fail with
/// [`StoreError::TransientFailure`](crate::StoreError::TransientFailure).
/// Lookups are eventually consistent: a bundle just attached may not be
/// returned yet.
#[async_trait]
pub trait Ledger: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Ledger Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Attach a bundle at an address.
    async fn attach(&self, address: &Address, bundle: Bytes) -> Result<AttachReceipt>;

    /// All bundles visible at an address, in attach order. Empty if nothing
    /// has been published there yet.
    async fn lookup(&self, address: &Address) -> Result<Vec<Bytes>>;
}

/// Persistence of channel cursors between publishing sessions.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Insert or replace the cursor of a channel.
    async fn save_cursor(&self, cursor: &ChannelCursor) -> Result<()>;

    /// Load the cursor of a channel, if one was saved.
    async fn load_cursor(&self, channel_id: &ChannelId) -> Result<Option<ChannelCursor>>;
}

#[async_trait]
impl<T: Ledger + ?Sized> Ledger for Arc<T> {
    async fn attach(&self, address: &Address, bundle: Bytes) -> Result<AttachReceipt> {
        (**self).attach(address, bundle).await
    }

    async fn lookup(&self, address: &Address) -> Result<Vec<Bytes>> {
        (**self).lookup(address).await
    }
}

#[async_trait]
impl<T: CursorStore + ?Sized> CursorStore for Arc<T> {
    async fn save_cursor(&self, cursor: &ChannelCursor) -> Result<()> {
        (**self).save_cursor(cursor).await
    }

    async fn load_cursor(&self, channel_id: &ChannelId) -> Result<Option<ChannelCursor>> {
        (**self).load_cursor(channel_id).await
    }
}
