//! # MAM Store
//!
//! The ledger collaborator behind a MAM channel, and persistence for channel
//! cursors.
//!
//! ## Key Types
//!
//! - [`Ledger`] - Async contract: attach a bundle at an address, look up an address
//! - [`CursorStore`] - Save and load [`ChannelCursor`](mam_core::ChannelCursor)s
//! - [`SqliteLedger`] - SQLite-based persistent ledger
//! - [`MemoryLedger`] - In-memory ledger with injectable delay and failures
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use mam_core::Address;
//! use mam_store::{Ledger, SqliteLedger};
//!
//! async fn example() -> mam_store::Result<()> {
//!     let ledger = SqliteLedger::open("ledger.db")?;
//!     let address = Address::from_bytes([0; 32]);
//!     ledger.attach(&address, Bytes::from_static(b"bundle")).await?;
//!     let bundles = ledger.lookup(&address).await?;
//!     assert_eq!(bundles.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Idempotent attach**: attaching the same bundle twice returns `AlreadyAttached`
//! - **Several bundles per address**: lookups return all of them in attach order
//! - **Eventual consistency**: callers must treat an empty lookup as "not yet"

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryLedger;
pub use sqlite::SqliteLedger;
pub use traits::{AttachReceipt, AttachStatus, CursorStore, Ledger};

/// Current time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
