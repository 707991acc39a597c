//! # MAM Testkit
//!
//! Testing utilities for MAM channels.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Fixed channels and payloads with pinned outputs
//! - **Generators**: Proptest strategies for seeds, side keys, modes and payloads
//! - **Fixtures**: Channels over in-memory ledgers, ready to publish
//!
//! ## Golden Vectors
//!
//! ```rust
//! use mam_testkit::vectors::verify_all_vectors;
//!
//! for report in verify_all_vectors() {
//!     println!("{}: {} ({})", report.name, report.root, report.matches);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use mam_testkit::generators::{state_from_params, ChannelParams};
//!
//! proptest! {
//!     #[test]
//!     fn root_is_deterministic(params: ChannelParams) {
//!         let s1 = state_from_params(&params);
//!         let s2 = state_from_params(&params);
//!         prop_assert_eq!(s1.current_root(), s2.current_root());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use mam_testkit::fixtures::TestChannel;
//!
//! # async fn example() {
//! let mut channel = TestChannel::new("SEEDVALUE");
//! let receipts = channel.publish_texts(&["HELLO", "WORLD"]).await;
//! # }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{fast_config, shared_ledger_channels, TestChannel};
pub use generators::{state_from_params, ChannelParams};
pub use vectors::{all_vectors, generate_message_from_vector, verify_all_vectors, GoldenVector};
