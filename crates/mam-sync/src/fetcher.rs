//! Fetcher: reads channel messages back from the ledger.
//!
//! Fetching never touches a publisher's [`ChannelState`](mam_core::ChannelState):
//! it only needs a root, a mode and, for restricted channels, a side key.
//! A root with nothing attached yet is a normal, retryable outcome and
//! yields an empty [`FetchResult`].

use std::collections::VecDeque;

use backoff::backoff::Backoff;
use mam_core::{decode, Address, CoreError, DecodedMessage, Mode, ModePolicy, Root, SideKey};
use mam_store::Ledger;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{FetchConfig, RetryPolicy};
use crate::error::{Result, SyncError};
use crate::retry::with_retry;

/// Messages read from one root, or from a walk along the chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    pub messages: Vec<DecodedMessage>,
    /// Root to continue from. `None` when a single-root fetch found nothing.
    pub next_root: Option<Root>,
}

impl FetchResult {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Reads and verifies channel messages.
pub struct Fetcher<L: Ledger> {
    ledger: L,
    retry: RetryPolicy,
    config: FetchConfig,
}

impl<L: Ledger> Fetcher<L> {
    pub fn new(ledger: L, retry: RetryPolicy, config: FetchConfig) -> Self {
        Self {
            ledger,
            retry,
            config,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Single root
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch the messages published at `root`.
    ///
    /// Restricted channels need a side key ([`CoreError::MissingSideKey`]
    /// otherwise).
    pub async fn fetch_single(
        &self,
        root: &Root,
        mode: Mode,
        side_key: Option<SideKey>,
    ) -> Result<FetchResult> {
        let policy = ModePolicy::for_fetch(mode, side_key)?;
        self.fetch_at(&policy.address(root), root, &policy).await
    }

    /// Fetch and verify the bundles at a known address.
    ///
    /// Every bundle found must authenticate against `root` under `policy`;
    /// one that does not fails the whole call.
    pub async fn fetch_at(
        &self,
        address: &Address,
        root: &Root,
        policy: &ModePolicy,
    ) -> Result<FetchResult> {
        let bundles = with_retry(&self.retry, "lookup", || self.ledger.lookup(address)).await?;
        debug!(%address, bundles = bundles.len(), "looked up address");

        let messages = bundles
            .iter()
            .map(|bundle| decode(bundle, root, policy))
            .collect::<mam_core::Result<Vec<_>>>()?;

        let next_root = match messages.split_first() {
            None => None,
            Some((first, rest)) => {
                if rest.iter().any(|m| m.next_root != first.next_root) {
                    return Err(CoreError::ProtocolViolation(format!(
                        "conflicting next roots at {}",
                        address
                    ))
                    .into());
                }
                Some(first.next_root)
            }
        };

        Ok(FetchResult {
            messages,
            next_root,
        })
    }

    /// Fetch at `root`, polling with backoff until something shows up.
    ///
    /// Fails with [`SyncError::Timeout`] once the poll policy's attempts or
    /// time budget are used up.
    pub async fn poll(
        &self,
        root: &Root,
        mode: Mode,
        side_key: Option<SideKey>,
    ) -> Result<FetchResult> {
        let policy = ModePolicy::for_fetch(mode, side_key)?;
        let address = policy.address(root);
        let poll = &self.config.poll;

        tokio::time::timeout(poll.timeout, self.poll_at(&address, root, &policy))
            .await
            .map_err(|_| {
                SyncError::Timeout(format!("no message at {} within {:?}", address, poll.timeout))
            })?
    }

    async fn poll_at(
        &self,
        address: &Address,
        root: &Root,
        policy: &ModePolicy,
    ) -> Result<FetchResult> {
        let poll = &self.config.poll;
        let mut backoff = poll.backoff();

        for attempt in 1..=poll.attempts() {
            let result = self.fetch_at(address, root, policy).await?;
            if !result.is_empty() {
                return Ok(result);
            }
            if attempt < poll.attempts() {
                let delay = backoff.next_backoff().unwrap_or(poll.max_backoff);
                debug!(%address, attempt, ?delay, "nothing published yet, polling again");
                tokio::time::sleep(delay).await;
            }
        }

        Err(SyncError::Timeout(format!(
            "no message at {} after {} polls",
            address,
            poll.attempts()
        )))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Chain walking
    // ─────────────────────────────────────────────────────────────────────────

    /// Walk the chain from `root` until a root with nothing published.
    ///
    /// `next_root` of the result is where the next message will appear. At
    /// most `max_chain_length` links are followed per call; call again with
    /// the returned root to continue.
    pub async fn fetch(
        &self,
        root: &Root,
        mode: Mode,
        side_key: Option<SideKey>,
    ) -> Result<FetchResult> {
        self.fetch_with(root, mode, side_key, |_| {}).await
    }

    /// Like [`Fetcher::fetch`], calling `on_message` as each message is read.
    pub async fn fetch_with<F>(
        &self,
        root: &Root,
        mode: Mode,
        side_key: Option<SideKey>,
        mut on_message: F,
    ) -> Result<FetchResult>
    where
        F: FnMut(&DecodedMessage),
    {
        let mut walker = self.walk(root, mode, side_key)?;
        let mut messages = Vec::new();

        loop {
            if walker.pending.is_empty() && walker.links >= self.config.max_chain_length {
                debug!(links = walker.links, "chain length limit reached");
                break;
            }
            match walker.next().await? {
                Some(message) => {
                    on_message(&message);
                    messages.push(message);
                }
                None => break,
            }
        }

        info!(
            messages = messages.len(),
            links = walker.links,
            "fetched channel"
        );
        Ok(FetchResult {
            messages,
            next_root: Some(walker.root()),
        })
    }

    /// A lazy walker over the chain starting at `root`.
    pub fn walk(
        &self,
        root: &Root,
        mode: Mode,
        side_key: Option<SideKey>,
    ) -> Result<ChainWalker<'_, L>> {
        Ok(ChainWalker {
            fetcher: self,
            policy: ModePolicy::for_fetch(mode, side_key)?,
            root: *root,
            pending: VecDeque::new(),
            links: 0,
        })
    }
}

/// Restartable cursor over a channel.
///
/// [`ChainWalker::next`] yields messages in order and returns `None` at the
/// first root with nothing published. Calling it again later picks up from
/// that same root, so a walker can follow a live channel.
pub struct ChainWalker<'a, L: Ledger> {
    fetcher: &'a Fetcher<L>,
    policy: ModePolicy,
    root: Root,
    pending: VecDeque<DecodedMessage>,
    links: usize,
}

impl<'a, L: Ledger> ChainWalker<'a, L> {
    /// The next message on the chain, if one has been published.
    pub async fn next(&mut self) -> Result<Option<DecodedMessage>> {
        if let Some(message) = self.pending.pop_front() {
            return Ok(Some(message));
        }

        let address = self.policy.address(&self.root);
        let result = self.fetcher.fetch_at(&address, &self.root, &self.policy).await?;
        match result.next_root {
            Some(next_root) => {
                self.pending.extend(result.messages);
                self.root = next_root;
                self.links += 1;
                Ok(self.pending.pop_front())
            }
            None => Ok(None),
        }
    }

    /// Root the walker will read next.
    pub fn root(&self) -> Root {
        self.root
    }

    /// Number of roots that held messages so far.
    pub fn links(&self) -> usize {
        self.links
    }
}
