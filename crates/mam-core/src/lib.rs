//! # MAM Core
//!
//! Pure primitives for Masked Authenticated Messaging channels: trytes,
//! roots, one-time signatures, channel state and message encoding.
//!
//! This crate contains no I/O, no storage, no networking. Every operation is
//! a deterministic computation over a seed, a position and a mode.
//!
//! ## Key Types
//!
//! - [`ChannelState`] - Value-threaded publishing state of one channel
//! - [`ModePolicy`] - Address and confidentiality rules for Public, Private, Restricted
//! - [`Message`] - A bundle ready to attach, plus the advanced state
//! - [`DecodedMessage`] - A verified message read back from the ledger
//!
//! ## Authentication
//!
//! Each position's [`Root`] commits to a Winternitz one-time key. A fetcher
//! that only knows the root can verify the publisher. See [`ots`].

pub mod channel;
pub mod cipher;
pub mod codec;
pub mod crypto;
pub mod decode;
pub mod error;
pub mod message;
pub mod mode;
pub mod ots;
pub mod types;

pub use channel::{derive_root, ChannelCursor, ChannelState};
pub use codec::{decode_str, encode_str, Trytes};
pub use crypto::Blake3Hash;
pub use decode::{decode, DecodedMessage};
pub use error::{CoreError, Result};
pub use message::{create, Message, MessageBuilder};
pub use mode::{Mode, ModePolicy};
pub use types::{Address, ChannelId, Root, SecurityLevel, Seed, SideKey};
