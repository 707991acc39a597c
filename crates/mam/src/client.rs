//! The MAM client: unified API over channel state, publishing and fetching.

use std::sync::Arc;

use mam_core::{
    create, encode_str, Address, ChannelState, DecodedMessage, Message, MessageBuilder, Mode,
    ModePolicy, Root, Seed, SideKey, Trytes,
};
use mam_store::{AttachReceipt, CursorStore, Ledger};
use mam_sync::{ChainWalker, FetchResult, Fetcher, Publisher};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::MamConfig;
use crate::error::Result;

/// Record of a published message, in the shape publishers print or store
/// to continue a channel later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    /// Root fetchers start from.
    pub root: Root,
    pub address: Address,
    pub next_root: Root,
    /// Number of messages published so far; replaying this many steps
    /// from a fresh channel reaches the state to continue from.
    pub start: u64,
}

impl PublishReceipt {
    fn from_message(message: &Message) -> Self {
        Self {
            root: message.root,
            address: message.address,
            next_root: message.next_root,
            start: message.position + 1,
        }
    }
}

/// A MAM client bound to one ledger.
///
/// Channel operations (`init`, `change_mode`, `create`) are pure and return
/// new [`ChannelState`] values; only `attach`, `publish` and the fetch
/// family touch the ledger.
pub struct Mam<L: Ledger> {
    ledger: Arc<L>,
    publisher: Publisher<Arc<L>>,
    fetcher: Fetcher<Arc<L>>,
    config: MamConfig,
}

impl<L: Ledger> Mam<L> {
    /// Create a client over `ledger`.
    pub fn new(ledger: L, config: MamConfig) -> Self {
        Self::with_shared(Arc::new(ledger), config)
    }

    /// Create a client over a ledger shared with other clients.
    pub fn with_shared(ledger: Arc<L>, config: MamConfig) -> Self {
        Self {
            publisher: Publisher::new(ledger.clone(), config.retry.clone()),
            fetcher: Fetcher::new(ledger.clone(), config.retry.clone(), config.fetch.clone()),
            ledger,
            config,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn config(&self) -> &MamConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Channel State
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a public channel at position 0, generating a seed if none is given.
    pub fn init<R: RngCore + CryptoRng>(&self, rng: &mut R, seed: Option<Seed>) -> ChannelState {
        let seed = seed.unwrap_or_else(|| Seed::generate(rng));
        ChannelState::new(seed, self.config.security)
    }

    /// Switch a channel's mode. Restricted mode needs a side key.
    pub fn change_mode(
        &self,
        state: &ChannelState,
        mode: Mode,
        side_key: Option<&str>,
    ) -> Result<ChannelState> {
        Ok(state.change_mode(mode, side_key)?)
    }

    /// Build the message for the channel's current position.
    ///
    /// The returned message carries the advanced state; keep it to publish
    /// the next message.
    pub fn create(&self, state: &ChannelState, payload: Trytes) -> Result<Message> {
        Ok(create(state, payload)?)
    }

    /// Like [`Mam::create`] for UTF-8 text, packed into trytes first.
    pub fn create_text(&self, state: &ChannelState, text: &str) -> Result<Message> {
        self.create(state, encode_str(text))
    }

    /// Build a message under a different side key than the channel's own.
    /// The channel keeps its stored key.
    pub fn create_with_side_key(
        &self,
        state: &ChannelState,
        payload: Trytes,
        side_key: &str,
    ) -> Result<Message> {
        Ok(MessageBuilder::new(state, payload)
            .side_key(SideKey::new(side_key)?)
            .build()?)
    }

    /// Rebuild a channel by replaying `start` positions from a fresh
    /// `init(seed)` in the given mode.
    pub fn replay(
        &self,
        seed: Seed,
        mode: Mode,
        side_key: Option<&str>,
        start: u64,
    ) -> Result<ChannelState> {
        let state = ChannelState::new(seed, self.config.security).change_mode(mode, side_key)?;
        Ok(state.replay(start)?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Publishing
    // ─────────────────────────────────────────────────────────────────────────

    /// Attach a created message to the ledger.
    pub async fn attach(&self, message: &Message) -> Result<AttachReceipt> {
        Ok(self.publisher.attach(message).await?)
    }

    /// Create and attach in one step.
    ///
    /// Returns the publish record and the state to continue from. If the
    /// attach fails, `state` is still the state to retry with.
    pub async fn publish(
        &self,
        state: &ChannelState,
        payload: Trytes,
    ) -> Result<(PublishReceipt, ChannelState)> {
        let message = self.create(state, payload)?;
        self.attach(&message).await?;

        let receipt = PublishReceipt::from_message(&message);
        info!(start = receipt.start, root = %receipt.root, "published");
        Ok((receipt, message.state))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Fetching
    // ─────────────────────────────────────────────────────────────────────────

    /// Walk the channel from `root` to the first unpublished root.
    pub async fn fetch(
        &self,
        root: &Root,
        mode: Mode,
        side_key: Option<&str>,
    ) -> Result<FetchResult> {
        let side_key = parse_side_key(mode, side_key)?;
        Ok(self.fetcher.fetch(root, mode, side_key).await?)
    }

    /// Like [`Mam::fetch`], calling `on_message` for each message in order.
    pub async fn fetch_with<F>(
        &self,
        root: &Root,
        mode: Mode,
        side_key: Option<&str>,
        on_message: F,
    ) -> Result<FetchResult>
    where
        F: FnMut(&DecodedMessage),
    {
        let side_key = parse_side_key(mode, side_key)?;
        Ok(self.fetcher.fetch_with(root, mode, side_key, on_message).await?)
    }

    /// Fetch only the messages at `root`. Empty if nothing is published yet.
    pub async fn fetch_single(
        &self,
        root: &Root,
        mode: Mode,
        side_key: Option<&str>,
    ) -> Result<FetchResult> {
        let side_key = parse_side_key(mode, side_key)?;
        Ok(self.fetcher.fetch_single(root, mode, side_key).await?)
    }

    /// Fetch the bundles at an explicit address and authenticate them
    /// against `root`.
    ///
    /// Unlike [`Mam::fetch_single`], a side key that does not match the
    /// publisher's fails here with a protocol violation instead of looking
    /// at an empty address.
    pub async fn fetch_at(
        &self,
        address: &Address,
        root: &Root,
        mode: Mode,
        side_key: Option<&str>,
    ) -> Result<FetchResult> {
        let policy = ModePolicy::for_fetch(mode, parse_side_key(mode, side_key)?)?;
        Ok(self.fetcher.fetch_at(address, root, &policy).await?)
    }

    /// Wait, with bounded backoff, until a message appears at `root`.
    pub async fn poll(
        &self,
        root: &Root,
        mode: Mode,
        side_key: Option<&str>,
    ) -> Result<FetchResult> {
        let side_key = parse_side_key(mode, side_key)?;
        Ok(self.fetcher.poll(root, mode, side_key).await?)
    }

    /// A lazy, restartable walker over the channel from `root`.
    pub fn walk(
        &self,
        root: &Root,
        mode: Mode,
        side_key: Option<&str>,
    ) -> Result<ChainWalker<'_, Arc<L>>> {
        let side_key = parse_side_key(mode, side_key)?;
        Ok(self.fetcher.walk(root, mode, side_key)?)
    }
}

impl<L: Ledger + CursorStore> Mam<L> {
    // ─────────────────────────────────────────────────────────────────────────
    // Resumption
    // ─────────────────────────────────────────────────────────────────────────

    /// Remember where a channel stands.
    pub async fn save_cursor(&self, state: &ChannelState) -> Result<()> {
        let cursor = state.cursor();
        debug!(channel = %cursor.channel_id, position = cursor.position, "saving cursor");
        Ok(self.ledger.save_cursor(&cursor).await?)
    }

    /// Continue the channel owned by `seed` from its saved cursor.
    ///
    /// `None` if no cursor was saved for this seed.
    pub async fn resume(&self, seed: Seed) -> Result<Option<ChannelState>> {
        let channel_id = seed.channel_id();
        match self.ledger.load_cursor(&channel_id).await? {
            Some(cursor) => {
                debug!(channel = %channel_id, position = cursor.position, "resuming channel");
                Ok(Some(ChannelState::resume(seed, &cursor)?))
            }
            None => Ok(None),
        }
    }

    /// [`Mam::publish`], then save the advanced cursor.
    pub async fn publish_and_save(
        &self,
        state: &ChannelState,
        payload: Trytes,
    ) -> Result<(PublishReceipt, ChannelState)> {
        let (receipt, next) = self.publish(state, payload).await?;
        self.save_cursor(&next).await?;
        Ok((receipt, next))
    }
}

/// Side keys only matter to restricted channels; anything passed for the
/// other modes is ignored, as `change_mode` does.
fn parse_side_key(mode: Mode, side_key: Option<&str>) -> Result<Option<SideKey>> {
    match (mode, side_key) {
        (Mode::Restricted, Some(raw)) => Ok(Some(SideKey::new(raw)?)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MamError;
    use mam_core::{decode_str, derive_root, SecurityLevel};
    use mam_store::MemoryLedger;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mam() -> Mam<MemoryLedger> {
        let config = MamConfig {
            security: SecurityLevel::Low,
            ..MamConfig::default()
        };
        Mam::new(MemoryLedger::new(), config)
    }

    fn seed() -> Seed {
        Seed::new("SEEDVALUE").unwrap()
    }

    #[test]
    fn test_init_uses_configured_security() {
        let mam = mam();
        let state = mam.init(&mut StdRng::seed_from_u64(7), None);
        assert_eq!(state.security(), SecurityLevel::Low);
        assert_eq!(state.position(), 0);
    }

    #[test]
    fn test_replay_matches_sequential_create() {
        let mam = mam();
        let mut state = mam
            .change_mode(&mam.init(&mut rand::thread_rng(), Some(seed())), Mode::Private, None)
            .unwrap();
        for i in 0..3 {
            state = mam.create_text(&state, &format!("MSG{}", i)).unwrap().state;
        }

        let replayed = mam.replay(seed(), Mode::Private, None, 3).unwrap();
        assert_eq!(replayed, state);
    }

    #[tokio::test]
    async fn test_publish_receipt() {
        let mam = mam();
        let state = mam.init(&mut rand::thread_rng(), Some(seed()));

        let (receipt, next) = mam.publish(&state, encode_str("HELLO")).await.unwrap();
        assert_eq!(receipt.root, state.current_root());
        assert_eq!(receipt.next_root, derive_root(&seed(), 1, SecurityLevel::Low));
        assert_eq!(receipt.start, 1);
        assert_eq!(next.position(), 1);

        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["root"], state.current_root().to_string());
        assert_eq!(json["start"], 1);
    }

    #[tokio::test]
    async fn test_fetch_text_roundtrip() {
        let mam = mam();
        let state = mam.init(&mut rand::thread_rng(), Some(seed()));
        mam.publish(&state, encode_str(r#"{"item":"Light_1","state":"ON"}"#))
            .await
            .unwrap();

        let result = mam.fetch(&state.current_root(), Mode::Public, None).await.unwrap();
        assert_eq!(result.messages.len(), 1);
        assert_eq!(
            decode_str(&result.messages[0].payload).unwrap(),
            r#"{"item":"Light_1","state":"ON"}"#
        );
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_side_key_text() {
        let mam = mam();
        let root = mam.init(&mut rand::thread_rng(), Some(seed())).current_root();
        let err = mam
            .fetch(&root, Mode::Restricted, Some("not a key!"))
            .await
            .unwrap_err();
        assert!(matches!(err, MamError::InvalidModeConfiguration(_)));
    }

    #[tokio::test]
    async fn test_side_key_ignored_outside_restricted() {
        let mam = mam();
        let state = mam.init(&mut rand::thread_rng(), Some(seed()));
        mam.publish(&state, encode_str("OPEN")).await.unwrap();

        let root = state.current_root();
        let result = mam
            .fetch_single(&root, Mode::Public, Some("not a key!"))
            .await
            .unwrap();
        assert_eq!(result.messages.len(), 1);

        let result = mam.fetch(&root, Mode::Public, Some("ANYKEY")).await.unwrap();
        assert_eq!(result.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_resume_from_saved_cursor() {
        let mam = mam();
        let state = mam
            .change_mode(
                &mam.init(&mut rand::thread_rng(), Some(seed())),
                Mode::Restricted,
                Some("PASSWORD"),
            )
            .unwrap();

        assert!(mam.resume(seed()).await.unwrap().is_none());

        let (_, state) = mam.publish_and_save(&state, encode_str("ONE")).await.unwrap();
        let (_, state) = mam.publish_and_save(&state, encode_str("TWO")).await.unwrap();

        let resumed = mam.resume(seed()).await.unwrap().unwrap();
        assert_eq!(resumed, state);
    }
}
