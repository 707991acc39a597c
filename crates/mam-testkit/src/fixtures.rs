//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;
use std::time::Duration;

use mam::{Mam, MamConfig, PublishReceipt};
use mam_core::{encode_str, ChannelState, Mode, SecurityLevel, Seed};
use mam_store::MemoryLedger;
use mam_sync::{FetchConfig, RetryPolicy};

/// Config with the cheapest security level and millisecond retries, so
/// tests exercising failures stay fast.
pub fn fast_config() -> MamConfig {
    MamConfig {
        security: SecurityLevel::Low,
        retry: RetryPolicy::fixed(3, Duration::from_millis(2)),
        fetch: FetchConfig {
            max_chain_length: 256,
            poll: RetryPolicy::fixed(10, Duration::from_millis(10)),
        },
    }
}

/// A channel over an in-memory ledger.
pub struct TestChannel {
    pub mam: Mam<MemoryLedger>,
    pub state: ChannelState,
}

impl TestChannel {
    /// Public channel with a deterministic seed.
    pub fn new(seed: &str) -> Self {
        Self::with_ledger(seed, Arc::new(MemoryLedger::new()))
    }

    /// Public channel writing to a ledger shared with other fixtures.
    pub fn with_ledger(seed: &str, ledger: Arc<MemoryLedger>) -> Self {
        let mam = Mam::with_shared(ledger, fast_config());
        let seed = Seed::new(seed).expect("fixture seed");
        let state = mam.init(&mut rand::thread_rng(), Some(seed));
        Self { mam, state }
    }

    /// Switch the channel's mode.
    pub fn mode(mut self, mode: Mode, side_key: Option<&str>) -> Self {
        self.state = self
            .mam
            .change_mode(&self.state, mode, side_key)
            .expect("fixture mode");
        self
    }

    pub fn seed(&self) -> &Seed {
        self.state.seed()
    }

    /// Publish each text in order, advancing the channel.
    pub async fn publish_texts(&mut self, texts: &[&str]) -> Vec<PublishReceipt> {
        let mut receipts = Vec::with_capacity(texts.len());
        for text in texts {
            let (receipt, next) = self
                .mam
                .publish(&self.state, encode_str(text))
                .await
                .expect("fixture publish");
            self.state = next;
            receipts.push(receipt);
        }
        receipts
    }
}

/// Several channels sharing one ledger, each with its own seed.
pub fn shared_ledger_channels(count: usize) -> (Arc<MemoryLedger>, Vec<TestChannel>) {
    let ledger = Arc::new(MemoryLedger::new());
    let channels = (0..count)
        .map(|i| TestChannel::with_ledger(&format!("FIXTURE{}", letter(i)), ledger.clone()))
        .collect();
    (ledger, channels)
}

fn letter(i: usize) -> char {
    (b'A' + (i % 26) as u8) as char
}

#[cfg(test)]
mod tests {
    use super::*;
    use mam_core::decode_str;

    #[tokio::test]
    async fn test_fixture_publish_chain() {
        let mut channel = TestChannel::new("FIXTURESEED");
        let receipts = channel.publish_texts(&["ONE", "TWO"]).await;

        assert_eq!(receipts.len(), 2);
        assert_eq!(receipts[0].next_root, receipts[1].root);
        assert_eq!(channel.state.position(), 2);
    }

    #[tokio::test]
    async fn test_shared_ledger_keeps_channels_apart() {
        let (ledger, mut channels) = shared_ledger_channels(3);
        let mut roots = Vec::new();
        for channel in &mut channels {
            roots.push(channel.publish_texts(&["HI"]).await[0].root);
        }

        assert_eq!(ledger.len().unwrap(), 3);
        assert_ne!(roots[0], roots[1]);
        assert_ne!(roots[1], roots[2]);

        let result = channels[1]
            .mam
            .fetch(&roots[1], Mode::Public, None)
            .await
            .unwrap();
        assert_eq!(result.messages.len(), 1);
        assert_eq!(decode_str(&result.messages[0].payload).unwrap(), "HI");
    }

    #[tokio::test]
    async fn test_restricted_fixture() {
        let mut channel = TestChannel::new("FIXTURESEED").mode(Mode::Restricted, Some("KEY"));
        let root = channel.publish_texts(&["SECRET"]).await[0].root;

        let result = channel
            .mam
            .fetch_single(&root, Mode::Restricted, Some("KEY"))
            .await
            .unwrap();
        assert_eq!(result.messages.len(), 1);
    }
}
