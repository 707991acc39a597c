//! Hashing and pseudo-random generation.
//!
//! Everything is Blake3 with a distinct derive-key context per use, so no two
//! derivations can collide across purposes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Derive-key contexts. Changing any of these changes every root.
pub mod domain {
    pub const OTS_KEY: &str = "mam-rs 2024 ots secret key";
    pub const OTS_CHAIN: &str = "mam-rs 2024 ots hash chain";
    pub const SIGNED_DIGEST: &str = "mam-rs 2024 signed digest";
    pub const MERKLE_LEAF: &str = "mam-rs 2024 merkle leaf";
    pub const MERKLE_NODE: &str = "mam-rs 2024 merkle node";
    pub const RESTRICTED_ADDRESS: &str = "mam-rs 2024 restricted address";
    pub const PRIVATE_KEY: &str = "mam-rs 2024 private channel key";
    pub const SIDE_KEY: &str = "mam-rs 2024 side key";
    pub const NONCE: &str = "mam-rs 2024 message nonce";
    pub const CHANNEL_ID: &str = "mam-rs 2024 channel id";
}

/// A 32-byte Blake3 hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Blake3Hash(pub [u8; 32]);

impl Blake3Hash {
    /// Compute the Blake3 hash of the given data.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Domain-separated hash over several parts.
    pub fn derive(context: &str, parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key(context);
        for part in parts {
            hasher.update(part);
        }
        Self(*hasher.finalize().as_bytes())
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The zero hash (sentinel value).
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for Blake3Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blake3({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Blake3Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Blake3Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Deterministic pseudo-random byte stream.
///
/// Keyed by a context, the caller's secret material and an index; the same
/// inputs always yield the same stream.
pub struct Prng {
    reader: blake3::OutputReader,
}

impl Prng {
    pub fn new(context: &str, secret: &[&[u8]], index: u64) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key(context);
        for part in secret {
            hasher.update(part);
        }
        hasher.update(&index.to_le_bytes());
        Self {
            reader: hasher.finalize_xof(),
        }
    }

    pub fn fill(&mut self, out: &mut [u8]) {
        self.reader.fill(out);
    }

    /// Next 32-byte block of the stream.
    pub fn next_block(&mut self) -> [u8; 32] {
        let mut block = [0u8; 32];
        self.reader.fill(&mut block);
        block
    }
}

impl fmt::Debug for Prng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Prng(..)")
    }
}
