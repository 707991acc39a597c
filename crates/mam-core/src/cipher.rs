//! Symmetric encryption for private and restricted channels.
//!
//! ChaCha20-Poly1305 with a key derived from the channel root (private) or
//! the side key (restricted). The nonce is derived from the root, which is
//! unique per position, so a key never sees the same nonce twice for
//! different messages of one channel.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};

use crate::crypto::{domain, Blake3Hash};
use crate::error::{CoreError, Result};
use crate::types::{Root, SideKey};

/// A 256-bit ChaCha20-Poly1305 key.
#[derive(Clone)]
pub struct ChannelKey([u8; 32]);

impl ChannelKey {
    /// Key for a private channel message: only holders of the root can read it.
    pub fn for_root(root: &Root) -> Self {
        Self(Blake3Hash::derive(domain::PRIVATE_KEY, &[&root.0[..]]).0)
    }

    /// Key for a restricted channel message.
    pub fn for_side_key(side_key: &SideKey) -> Self {
        Self(Blake3Hash::derive(domain::SIDE_KEY, &[side_key.as_bytes()]).0)
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encrypt data bound to the message root.
    pub fn encrypt(&self, plaintext: &[u8], root: &Root) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| CoreError::EncryptionError(e.to_string()))?;

        let nonce = message_nonce(root);
        cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| CoreError::EncryptionError(e.to_string()))
    }

    /// Decrypt data bound to the message root.
    ///
    /// A wrong key, wrong root or tampered ciphertext all fail the tag check.
    pub fn decrypt(&self, ciphertext: &[u8], root: &Root) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| CoreError::EncryptionError(e.to_string()))?;

        let nonce = message_nonce(root);
        cipher
            .decrypt(Nonce::from_slice(&nonce), ciphertext)
            .map_err(|_| CoreError::ProtocolViolation("message authentication failed".into()))
    }
}

impl std::fmt::Debug for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChannelKey(<redacted>)")
    }
}

fn message_nonce(root: &Root) -> [u8; 12] {
    let hash = Blake3Hash::derive(domain::NONCE, &[&root.0[..]]);
    let mut nonce = [0u8; 12];
    nonce.copy_from_slice(&hash.0[..12]);
    nonce
}
