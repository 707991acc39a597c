//! # MAM Sync
//!
//! Moves channel messages between a publisher, the ledger and fetchers.
//!
//! ## Overview
//!
//! The [`Publisher`] attaches bundles built by `mam_core::create`. The
//! [`Fetcher`] reads them back: a single root, a bounded poll at one root,
//! or a walk along the chain following each message's next root.
//!
//! ## Key Properties
//!
//! - **Bounded**: every ledger call retries transient failures with
//!   exponential backoff, capped by attempts and a timeout
//! - **Never silent**: a bundle that fails authentication fails the fetch
//! - **Restartable**: a [`ChainWalker`] resumes from the first unpublished root
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mam_core::{create, encode_str, ChannelState, Mode, Seed, SecurityLevel};
//! use mam_store::MemoryLedger;
//! use mam_sync::{FetchConfig, Fetcher, Publisher, RetryPolicy};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let ledger = Arc::new(MemoryLedger::new());
//!     let publisher = Publisher::new(ledger.clone(), RetryPolicy::default());
//!     let fetcher = Fetcher::new(ledger, RetryPolicy::default(), FetchConfig::default());
//!
//!     let state = ChannelState::new(Seed::new("SEEDVALUE")?, SecurityLevel::Medium);
//!     let message = create(&state, encode_str("HELLO"))?;
//!     publisher.attach(&message).await?;
//!
//!     let result = fetcher.fetch(&state.current_root(), Mode::Public, None).await?;
//!     assert_eq!(result.messages.len(), 1);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod fetcher;
pub mod publisher;
pub mod retry;

pub use config::{FetchConfig, RetryPolicy};
pub use error::{Result, SyncError};
pub use fetcher::{ChainWalker, FetchResult, Fetcher};
pub use publisher::Publisher;
pub use retry::with_retry;
