//! Channel state.
//!
//! A [`ChannelState`] is a value: every operation that moves a channel
//! forward returns a new state and leaves the old one untouched. Two states
//! cloned from the same value and advanced independently will claim the same
//! position; callers publishing on one seed must keep a single owner.

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::mode::{Mode, ModePolicy};
use crate::ots::OtsKey;
use crate::types::{ChannelId, Root, SecurityLevel, Seed, SideKey};

/// Root of `position` for the channel owned by `seed`.
///
/// Pure: identical inputs give identical roots in every process.
pub fn derive_root(seed: &Seed, position: u64, security: SecurityLevel) -> Root {
    OtsKey::derive(seed, position, security).public_root()
}

fn successor(position: u64) -> Result<u64> {
    position
        .checked_add(1)
        .ok_or(CoreError::PositionOverflow(position))
}

/// Publishing state of one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelState {
    seed: Seed,
    policy: ModePolicy,
    security: SecurityLevel,
    position: u64,
    current_root: Root,
    next_root: Root,
}

impl ChannelState {
    /// Start a public channel at position 0.
    ///
    /// Without a seed a fresh random one is generated.
    pub fn init<R: RngCore + CryptoRng>(rng: &mut R, seed: Option<Seed>) -> Self {
        let seed = seed.unwrap_or_else(|| Seed::generate(rng));
        Self::new(seed, SecurityLevel::default())
    }

    /// Start a public channel at position 0 with an explicit security level.
    pub fn new(seed: Seed, security: SecurityLevel) -> Self {
        Self {
            current_root: derive_root(&seed, 0, security),
            next_root: derive_root(&seed, 1, security),
            seed,
            policy: ModePolicy::Public,
            security,
            position: 0,
        }
    }

    fn at_position(
        seed: Seed,
        policy: ModePolicy,
        security: SecurityLevel,
        position: u64,
    ) -> Result<Self> {
        let next = successor(position)?;
        Ok(Self {
            current_root: derive_root(&seed, position, security),
            next_root: derive_root(&seed, next, security),
            seed,
            policy,
            security,
            position,
        })
    }

    /// Switch mode. The side key is only consulted for restricted channels.
    pub fn change_mode(&self, mode: Mode, side_key: Option<&str>) -> Result<Self> {
        let side_key = match (mode, side_key) {
            (Mode::Restricted, Some(raw)) => Some(SideKey::new(raw)?),
            _ => None,
        };
        Ok(self.with_policy(ModePolicy::new(mode, side_key)?))
    }

    /// Same channel and position under another policy.
    pub fn with_policy(&self, policy: ModePolicy) -> Self {
        Self {
            policy,
            ..self.clone()
        }
    }

    /// The state one position further along.
    ///
    /// This is the state transition performed by `create`. Fails with
    /// [`CoreError::PositionOverflow`] once the position counter is spent.
    pub fn advance(&self) -> Result<Self> {
        let position = successor(self.position)?;
        Ok(Self {
            seed: self.seed.clone(),
            policy: self.policy.clone(),
            security: self.security,
            position,
            current_root: self.next_root,
            next_root: derive_root(&self.seed, successor(position)?, self.security),
        })
    }

    /// Move forward `steps` positions one at a time, as a publisher that
    /// only remembers how many messages it sent would.
    pub fn replay(&self, steps: u64) -> Result<Self> {
        let mut state = self.clone();
        for _ in 0..steps {
            state = state.advance()?;
        }
        Ok(state)
    }

    /// Rebuild the state recorded in `cursor` without replaying.
    ///
    /// Cursors come back from storage, so the position is checked like any
    /// other input.
    pub fn resume(seed: Seed, cursor: &ChannelCursor) -> Result<Self> {
        if seed.channel_id() != cursor.channel_id {
            return Err(CoreError::CursorMismatch);
        }
        let policy = ModePolicy::new(cursor.mode, cursor.side_key.clone())?;
        Self::at_position(seed, policy, cursor.security, cursor.position)
    }

    /// Persistable summary of this state. Holds no seed.
    pub fn cursor(&self) -> ChannelCursor {
        ChannelCursor {
            channel_id: self.channel_id(),
            position: self.position,
            mode: self.policy.mode(),
            security: self.security,
            side_key: self.policy.side_key().cloned(),
        }
    }

    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    pub fn channel_id(&self) -> ChannelId {
        self.seed.channel_id()
    }

    pub fn policy(&self) -> &ModePolicy {
        &self.policy
    }

    pub fn mode(&self) -> Mode {
        self.policy.mode()
    }

    pub fn security(&self) -> SecurityLevel {
        self.security
    }

    /// Zero-based index of the next message to be created.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn current_root(&self) -> Root {
        self.current_root
    }

    pub fn next_root(&self) -> Root {
        self.next_root
    }
}

/// Where a channel stands, stored between publishing sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCursor {
    pub channel_id: ChannelId,
    pub position: u64,
    pub mode: Mode,
    pub security: SecurityLevel,
    pub side_key: Option<SideKey>,
}
