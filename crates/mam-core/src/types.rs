//! Strongly typed channel identifiers and secrets.

use rand::{CryptoRng, Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codec::{Trytes, TRYTE_ALPHABET};
use crate::crypto::{domain, Blake3Hash};
use crate::error::{CoreError, Result};

/// Length of a seed in trytes.
pub const SEED_LENGTH: usize = 81;

/// Maximum length of a side key in trytes. Shorter keys are padded with `9`.
pub const SIDE_KEY_LENGTH: usize = 81;

/// The root secret of a channel: 81 trytes.
///
/// Shorter input is padded with `9`, matching how ledger client libraries
/// treat short seeds.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Seed(Trytes);

impl Seed {
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let trytes =
            Trytes::new(s).map_err(|e| CoreError::InvalidSeed(e.to_string()))?;
        if trytes.is_empty() || trytes.len() > SEED_LENGTH {
            return Err(CoreError::InvalidSeed(format!(
                "expected 1 to {} trytes, got {}",
                SEED_LENGTH,
                trytes.len()
            )));
        }
        Ok(Self(trytes.padded(SEED_LENGTH)))
    }

    /// Generate a fresh random seed.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let s: String = (0..SEED_LENGTH)
            .map(|_| TRYTE_ALPHABET[rng.gen_range(0..TRYTE_ALPHABET.len())] as char)
            .collect();
        Self(Trytes::from_valid(s))
    }

    pub fn as_trytes(&self) -> &Trytes {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_str().as_bytes()
    }

    /// Public identifier of the channel this seed owns.
    pub fn channel_id(&self) -> ChannelId {
        ChannelId(Blake3Hash::derive(domain::CHANNEL_ID, &[self.as_bytes()]).0)
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(<redacted>)")
    }
}

impl TryFrom<String> for Seed {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<Seed> for String {
    fn from(seed: Seed) -> Self {
        seed.0.into()
    }
}

/// Auxiliary secret for restricted channels.
///
/// Input is uppercased, validated and padded to 81 trytes, so `"password"`
/// and `"PASSWORD9"` are the same key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SideKey(Trytes);

impl SideKey {
    pub fn new(s: &str) -> Result<Self> {
        let upper = s.to_ascii_uppercase();
        if upper.is_empty() {
            return Err(CoreError::InvalidModeConfiguration(
                "side key must not be empty".into(),
            ));
        }
        if upper.len() > SIDE_KEY_LENGTH {
            return Err(CoreError::InvalidModeConfiguration(format!(
                "side key longer than {} trytes",
                SIDE_KEY_LENGTH
            )));
        }
        let trytes = Trytes::new(upper)
            .map_err(|e| CoreError::InvalidModeConfiguration(format!("side key: {}", e)))?;
        Ok(Self(trytes.padded(SIDE_KEY_LENGTH)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_str().as_bytes()
    }
}

impl fmt::Debug for SideKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SideKey(<redacted>)")
    }
}

impl TryFrom<String> for SideKey {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(&s)
    }
}

impl From<SideKey> for String {
    fn from(key: SideKey) -> Self {
        key.0.into()
    }
}

/// The root of a channel position: the merkle root of its one-time key.
///
/// Serializes as its 64-tryte form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Trytes", into = "Trytes")]
pub struct Root(pub [u8; 32]);

impl Root {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Render as trytes (64 symbols), the form handed to fetchers.
    pub fn to_trytes(&self) -> Trytes {
        Trytes::from_bytes(&self.0)
    }

    pub fn from_trytes(trytes: &Trytes) -> Result<Self> {
        let bytes = trytes.to_bytes()?;
        let arr: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            CoreError::EncodingError(format!("root must be 32 bytes, got {}", v.len()))
        })?;
        Ok(Self(arr))
    }

    pub fn parse(s: &str) -> Result<Self> {
        Self::from_trytes(&Trytes::new(s)?)
    }
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Root({}..)", &self.to_trytes().as_str()[..16])
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_trytes())
    }
}

impl From<[u8; 32]> for Root {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<Trytes> for Root {
    type Error = CoreError;

    fn try_from(trytes: Trytes) -> Result<Self> {
        Self::from_trytes(&trytes)
    }
}

impl From<Root> for Trytes {
    fn from(root: Root) -> Self {
        root.to_trytes()
    }
}

/// Ledger location a message is attached to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Trytes", into = "Trytes")]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn to_trytes(&self) -> Trytes {
        Trytes::from_bytes(&self.0)
    }

    pub fn from_trytes(trytes: &Trytes) -> Result<Self> {
        Root::from_trytes(trytes).map(|r| Self(r.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}..)", &self.to_trytes().as_str()[..16])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_trytes())
    }
}

impl From<Root> for Address {
    fn from(root: Root) -> Self {
        Self(root.0)
    }
}

impl TryFrom<Trytes> for Address {
    type Error = CoreError;

    fn try_from(trytes: Trytes) -> Result<Self> {
        Self::from_trytes(&trytes)
    }
}

impl From<Address> for Trytes {
    fn from(address: Address) -> Self {
        address.to_trytes()
    }
}

/// One-way identifier of a channel, safe to persist next to its cursor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub [u8; 32]);

impl ChannelId {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

/// Signature strength. Higher levels sign a wider digest with more hash chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum SecurityLevel {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl SecurityLevel {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Low),
            2 => Ok(Self::Medium),
            3 => Ok(Self::High),
            other => Err(CoreError::InvalidSecurityLevel(other)),
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Bytes of message digest covered by the one-time signature.
    pub fn digest_len(self) -> usize {
        16 * self.to_u8() as usize
    }
}

impl Default for SecurityLevel {
    fn default() -> Self {
        Self::Medium
    }
}

impl TryFrom<u8> for SecurityLevel {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self> {
        Self::from_u8(value)
    }
}

impl From<SecurityLevel> for u8 {
    fn from(level: SecurityLevel) -> Self {
        level.to_u8()
    }
}
