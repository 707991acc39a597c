//! # MAM
//!
//! Masked Authenticated Messaging: ordered, signed, optionally encrypted
//! message channels published on an append-only ledger.
//!
//! ## Overview
//!
//! A channel is a sequence of messages derived from one secret seed. Each
//! message is signed with a one-time key whose merkle root identifies the
//! position, and it names the root of the position after it, so a reader
//! holding any root can follow the channel forward.
//!
//! - **Public**: anyone with the root finds and reads the message
//! - **Private**: anyone with the root finds it, and the root is the key
//! - **Restricted**: address and key also depend on a shared side key
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mam::{Mam, MamConfig, Mode};
//! use mam::store::SqliteLedger;
//!
//! async fn example() -> mam::Result<()> {
//!     let ledger = SqliteLedger::open("ledger.db")?;
//!     let mam = Mam::new(ledger, MamConfig::default());
//!
//!     let state = mam.init(&mut rand::thread_rng(), None);
//!     let state = mam.change_mode(&state, Mode::Restricted, Some("PASSWORD"))?;
//!     let root = state.current_root();
//!
//!     let (receipt, _state) = mam.publish_and_save(&state, mam::encode_str("HELLO")).await?;
//!     println!("published, next root {}", receipt.next_root);
//!
//!     let fetched = mam.fetch(&root, Mode::Restricted, Some("PASSWORD")).await?;
//!     for message in &fetched.messages {
//!         println!("{}", mam::decode_str(&message.payload)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `mam::core` - channel state, codec, signing and the message format
//! - `mam::store` - ledger abstraction, in-memory and SQLite ledgers
//! - `mam::sync` - publishing, fetching and retry

pub mod client;
pub mod config;
pub mod error;

pub use mam_core as core;
pub use mam_store as store;
pub use mam_sync as sync;

pub use client::{Mam, PublishReceipt};
pub use config::MamConfig;
pub use error::{MamError, Result};

pub use mam_core::{
    decode_str, encode_str, Address, ChannelCursor, ChannelState, DecodedMessage, Message, Mode,
    Root, SecurityLevel, Seed, SideKey, Trytes,
};
pub use mam_sync::{FetchConfig, FetchResult, RetryPolicy};
