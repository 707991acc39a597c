//! Channel modes and the policy table they select.
//!
//! | Mode       | Address              | Payload                      |
//! |------------|----------------------|------------------------------|
//! | Public     | root                 | plaintext                    |
//! | Private    | root                 | encrypted, key from root     |
//! | Restricted | hash(root, side key) | encrypted, key from side key |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::cipher::ChannelKey;
use crate::crypto::{domain, Blake3Hash};
use crate::error::{CoreError, Result};
use crate::types::{Address, Root, SideKey};

/// Channel mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Public,
    Private,
    Restricted,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Public => "public",
            Mode::Private => "private",
            Mode::Restricted => "restricted",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Ok(Mode::Public),
            "private" => Ok(Mode::Private),
            "restricted" => Ok(Mode::Restricted),
            other => Err(CoreError::InvalidModeConfiguration(format!(
                "unknown mode {:?}",
                other
            ))),
        }
    }
}

/// A mode together with the key material it needs.
///
/// Restricted without a side key is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModePolicy {
    Public,
    Private,
    Restricted { side_key: SideKey },
}

impl ModePolicy {
    /// Build the policy a publisher switches to.
    ///
    /// A side key given for a public or private channel is ignored.
    pub fn new(mode: Mode, side_key: Option<SideKey>) -> Result<Self> {
        match (mode, side_key) {
            (Mode::Public, _) => Ok(ModePolicy::Public),
            (Mode::Private, _) => Ok(ModePolicy::Private),
            (Mode::Restricted, Some(side_key)) => Ok(ModePolicy::Restricted { side_key }),
            (Mode::Restricted, None) => Err(CoreError::InvalidModeConfiguration(
                "restricted mode requires a side key".into(),
            )),
        }
    }

    /// Build the policy a fetcher reads with.
    pub fn for_fetch(mode: Mode, side_key: Option<SideKey>) -> Result<Self> {
        match (mode, side_key) {
            (Mode::Restricted, None) => Err(CoreError::MissingSideKey),
            (mode, side_key) => Self::new(mode, side_key),
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            ModePolicy::Public => Mode::Public,
            ModePolicy::Private => Mode::Private,
            ModePolicy::Restricted { .. } => Mode::Restricted,
        }
    }

    pub fn side_key(&self) -> Option<&SideKey> {
        match self {
            ModePolicy::Restricted { side_key } => Some(side_key),
            _ => None,
        }
    }

    /// Replace the side key of a restricted policy for a single message.
    pub fn with_side_key(&self, side_key: SideKey) -> Result<Self> {
        match self {
            ModePolicy::Restricted { .. } => Ok(ModePolicy::Restricted { side_key }),
            other => Err(CoreError::InvalidModeConfiguration(format!(
                "side key override on a {} channel",
                other.mode()
            ))),
        }
    }

    /// Ledger address for a message at `root`.
    pub fn address(&self, root: &Root) -> Address {
        match self {
            ModePolicy::Public | ModePolicy::Private => Address::from(*root),
            ModePolicy::Restricted { side_key } => Address(
                Blake3Hash::derive(
                    domain::RESTRICTED_ADDRESS,
                    &[&root.0[..], side_key.as_bytes()],
                )
                .0,
            ),
        }
    }

    /// Protect a serialized message body.
    pub fn seal(&self, root: &Root, body: &[u8]) -> Result<Vec<u8>> {
        match self.channel_key(root) {
            None => Ok(body.to_vec()),
            Some(key) => key.encrypt(body, root),
        }
    }

    /// Reverse [`ModePolicy::seal`].
    pub fn open(&self, root: &Root, sealed: &[u8]) -> Result<Vec<u8>> {
        match self.channel_key(root) {
            None => Ok(sealed.to_vec()),
            Some(key) => key.decrypt(sealed, root),
        }
    }

    fn channel_key(&self, root: &Root) -> Option<ChannelKey> {
        match self {
            ModePolicy::Public => None,
            ModePolicy::Private => Some(ChannelKey::for_root(root)),
            ModePolicy::Restricted { side_key } => Some(ChannelKey::for_side_key(side_key)),
        }
    }
}

impl Default for ModePolicy {
    fn default() -> Self {
        ModePolicy::Public
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> SideKey {
        SideKey::new(s).unwrap()
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("public".parse::<Mode>().unwrap(), Mode::Public);
        assert_eq!("Private".parse::<Mode>().unwrap(), Mode::Private);
        assert_eq!("RESTRICTED".parse::<Mode>().unwrap(), Mode::Restricted);
        assert!("secret".parse::<Mode>().is_err());
    }

    #[test]
    fn test_restricted_requires_key() {
        assert!(matches!(
            ModePolicy::new(Mode::Restricted, None),
            Err(CoreError::InvalidModeConfiguration(_))
        ));
        assert!(matches!(
            ModePolicy::for_fetch(Mode::Restricted, None),
            Err(CoreError::MissingSideKey)
        ));
    }

    #[test]
    fn test_side_key_ignored_for_public() {
        let policy = ModePolicy::new(Mode::Public, Some(key("IGNORED"))).unwrap();
        assert_eq!(policy, ModePolicy::Public);
        assert!(policy.side_key().is_none());
    }

    #[test]
    fn test_addresses_per_mode() {
        let root = Root::from_bytes([7; 32]);
        assert_eq!(ModePolicy::Public.address(&root), Address::from(root));
        assert_eq!(ModePolicy::Private.address(&root), Address::from(root));

        let a = ModePolicy::new(Mode::Restricted, Some(key("ALPHA"))).unwrap();
        let b = ModePolicy::new(Mode::Restricted, Some(key("BRAVO"))).unwrap();
        assert_ne!(a.address(&root), Address::from(root));
        assert_ne!(a.address(&root), b.address(&root));
    }

    #[test]
    fn test_seal_open_per_mode() {
        let root = Root::from_bytes([9; 32]);
        let body = b"body bytes";

        let public = ModePolicy::Public;
        assert_eq!(public.seal(&root, body).unwrap(), body);

        for policy in [
            ModePolicy::Private,
            ModePolicy::new(Mode::Restricted, Some(key("PASSWORD"))).unwrap(),
        ] {
            let sealed = policy.seal(&root, body).unwrap();
            assert_ne!(sealed, body);
            assert_eq!(policy.open(&root, &sealed).unwrap(), body);
        }
    }

    #[test]
    fn test_override_only_on_restricted() {
        let restricted = ModePolicy::new(Mode::Restricted, Some(key("FIRST"))).unwrap();
        let overridden = restricted.with_side_key(key("SECOND")).unwrap();
        assert_eq!(overridden.side_key(), Some(&key("SECOND")));

        assert!(ModePolicy::Private.with_side_key(key("SECOND")).is_err());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Mode::Restricted).unwrap(), "\"restricted\"");
    }
}
