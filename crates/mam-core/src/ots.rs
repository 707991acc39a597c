//! Winternitz one-time signatures and the merkle root that commits to them.
//!
//! Each channel position owns one W-OTS key (w = 16) derived from the seed.
//! The key's public form is the set of chain end points; the position's
//! [`Root`] is the merkle root over those end points. A verifier holding only
//! the root can therefore authenticate a message: walking the signature
//! chains to their ends must rebuild the same root.
//!
//! A key must sign exactly one digest. Signing two different digests with
//! the same key leaks enough chain values to forge a third.

use crate::crypto::{domain, Blake3Hash, Prng};
use crate::error::{CoreError, Result};
use crate::types::{Root, SecurityLevel, Seed};

/// Steps per hash chain (Winternitz parameter w = 16).
pub const CHAIN_STEPS: u8 = 15;

/// Checksum digits appended to the message digits.
const CHECKSUM_DIGITS: usize = 3;

/// Number of hash chains for a security level.
pub fn chain_count(security: SecurityLevel) -> usize {
    security.digest_len() * 2 + CHECKSUM_DIGITS
}

/// A one-time signing key for a single channel position.
pub struct OtsKey {
    security: SecurityLevel,
    secrets: Vec<[u8; 32]>,
}

impl OtsKey {
    /// Derive the key for `position` of the channel owned by `seed`.
    pub fn derive(seed: &Seed, position: u64, security: SecurityLevel) -> Self {
        let mut prng = Prng::new(
            domain::OTS_KEY,
            &[seed.as_bytes(), &[security.to_u8()][..]],
            position,
        );
        let secrets = (0..chain_count(security))
            .map(|_| prng.next_block())
            .collect();
        Self { security, secrets }
    }

    pub fn security(&self) -> SecurityLevel {
        self.security
    }

    /// The root committing to this key.
    pub fn public_root(&self) -> Root {
        let ends: Vec<[u8; 32]> = self
            .secrets
            .iter()
            .enumerate()
            .map(|(i, secret)| chain(secret, i, 0, CHAIN_STEPS))
            .collect();
        Root(merkle_root(&ends))
    }

    /// Sign a message. The message is hashed internally.
    pub fn sign(&self, message: &[u8]) -> OtsSignature {
        let digits = digest_digits(message, self.security);
        let chains = self
            .secrets
            .iter()
            .zip(digits.iter())
            .enumerate()
            .map(|(i, (secret, &digit))| chain(secret, i, 0, digit))
            .collect();
        OtsSignature {
            security: self.security,
            chains,
        }
    }
}

impl std::fmt::Debug for OtsKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OtsKey({:?}, {} chains)", self.security, self.secrets.len())
    }
}

/// A W-OTS signature: one intermediate value per chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtsSignature {
    pub security: SecurityLevel,
    pub chains: Vec<[u8; 32]>,
}

impl OtsSignature {
    /// Recover the root of the key that produced this signature over `message`.
    ///
    /// The caller compares the result with the expected root; a wrong message
    /// or a forged signature yields a different root.
    pub fn recover_root(&self, message: &[u8]) -> Result<Root> {
        let expected = chain_count(self.security);
        if self.chains.len() != expected {
            return Err(CoreError::ProtocolViolation(format!(
                "signature has {} chains, security {:?} needs {}",
                self.chains.len(),
                self.security,
                expected
            )));
        }

        let digits = digest_digits(message, self.security);
        let ends: Vec<[u8; 32]> = self
            .chains
            .iter()
            .zip(digits.iter())
            .enumerate()
            .map(|(i, (value, &digit))| chain(value, i, digit, CHAIN_STEPS - digit))
            .collect();
        Ok(Root(merkle_root(&ends)))
    }

    /// Check the signature against an expected root.
    pub fn verify(&self, message: &[u8], root: &Root) -> Result<()> {
        let recovered = self.recover_root(message)?;
        if &recovered != root {
            return Err(CoreError::ProtocolViolation(
                "signature does not match channel root".into(),
            ));
        }
        Ok(())
    }
}

/// Advance `value` along chain `index` from step `from` by `steps` hashes.
fn chain(value: &[u8; 32], index: usize, from: u8, steps: u8) -> [u8; 32] {
    let mut current = *value;
    for step in from..from + steps {
        let mut hasher = blake3::Hasher::new_derive_key(domain::OTS_CHAIN);
        hasher.update(&(index as u32).to_le_bytes());
        hasher.update(&[step]);
        hasher.update(&current);
        current = *hasher.finalize().as_bytes();
    }
    current
}

/// Base-16 digits of the message digest followed by the checksum digits.
fn digest_digits(message: &[u8], security: SecurityLevel) -> Vec<u8> {
    let mut digest = vec![0u8; security.digest_len()];
    let mut hasher = blake3::Hasher::new_derive_key(domain::SIGNED_DIGEST);
    hasher.update(message);
    hasher.finalize_xof().fill(&mut digest);

    let mut digits = Vec::with_capacity(chain_count(security));
    for byte in digest {
        digits.push(byte >> 4);
        digits.push(byte & 0x0f);
    }

    // Lowering any message digit raises the checksum, so a forger cannot
    // only walk chains forward.
    let checksum: u32 = digits.iter().map(|&d| (CHAIN_STEPS - d) as u32).sum();
    for shift in (0..CHECKSUM_DIGITS).rev() {
        digits.push(((checksum >> (4 * shift)) & 0x0f) as u8);
    }
    digits
}

/// Merkle root over 32-byte leaves.
///
/// Leaves are hashed with their index; an odd node at the end of a level is
/// promoted unchanged. The root of no leaves is the zero hash.
pub fn merkle_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return Blake3Hash::ZERO.0;
    }

    let mut level: Vec<[u8; 32]> = leaves
        .iter()
        .enumerate()
        .map(|(i, leaf)| {
            let index = (i as u32).to_le_bytes();
            Blake3Hash::derive(domain::MERKLE_LEAF, &[&index[..], &leaf[..]]).0
        })
        .collect();

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => {
                    Blake3Hash::derive(domain::MERKLE_NODE, &[&left[..], &right[..]]).0
                }
                [single] => *single,
                _ => unreachable!("chunks(2) yields one or two items"),
            })
            .collect();
    }
    level[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> Seed {
        Seed::new("OTSTESTSEED").unwrap()
    }

    #[test]
    fn test_chain_counts() {
        assert_eq!(chain_count(SecurityLevel::Low), 35);
        assert_eq!(chain_count(SecurityLevel::Medium), 67);
        assert_eq!(chain_count(SecurityLevel::High), 99);
    }

    #[test]
    fn test_checksum_fits_three_digits() {
        // Worst case: every message digit is zero.
        let max = (SecurityLevel::High.digest_len() * 2) as u32 * CHAIN_STEPS as u32;
        assert!(max < 16u32.pow(CHECKSUM_DIGITS as u32));
    }

    #[test]
    fn test_sign_verify() {
        let key = OtsKey::derive(&seed(), 0, SecurityLevel::Medium);
        let root = key.public_root();
        let sig = key.sign(b"hello");

        sig.verify(b"hello", &root).expect("valid signature should verify");
        assert!(sig.verify(b"hellp", &root).is_err());
    }

    #[test]
    fn test_signature_bound_to_position() {
        let key0 = OtsKey::derive(&seed(), 0, SecurityLevel::Low);
        let key1 = OtsKey::derive(&seed(), 1, SecurityLevel::Low);
        let sig = key0.sign(b"payload");
        assert!(sig.verify(b"payload", &key1.public_root()).is_err());
    }

    #[test]
    fn test_truncated_signature_rejected() {
        let key = OtsKey::derive(&seed(), 3, SecurityLevel::Low);
        let mut sig = key.sign(b"payload");
        sig.chains.pop();
        assert!(matches!(
            sig.recover_root(b"payload"),
            Err(CoreError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_tampered_chain_rejected() {
        let key = OtsKey::derive(&seed(), 3, SecurityLevel::Low);
        let root = key.public_root();
        let mut sig = key.sign(b"payload");
        sig.chains[5][0] ^= 1;
        assert!(sig.verify(b"payload", &root).is_err());
    }

    #[test]
    fn test_security_level_changes_root() {
        let low = OtsKey::derive(&seed(), 0, SecurityLevel::Low).public_root();
        let high = OtsKey::derive(&seed(), 0, SecurityLevel::High).public_root();
        assert_ne!(low, high);
    }

    #[test]
    fn test_merkle_root_order_sensitive() {
        let a = [[1u8; 32], [2u8; 32], [3u8; 32]];
        let b = [[2u8; 32], [1u8; 32], [3u8; 32]];
        assert_ne!(merkle_root(&a), merkle_root(&b));
        assert_eq!(merkle_root(&a), merkle_root(&a));
        assert_eq!(merkle_root(&[]), [0u8; 32]);
    }
}
