//! Error types for MAM core operations.

use thiserror::Error;

/// Errors that can occur while building, encoding or decoding channel messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Restricted mode requested without a usable side key, or a side key
    /// override applied to a channel that is not restricted.
    #[error("invalid mode configuration: {0}")]
    InvalidModeConfiguration(String),

    /// A restricted channel was fetched without a side key.
    #[error("missing side key for restricted channel")]
    MissingSideKey,

    /// Input is not representable in the tryte alphabet.
    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    #[error("invalid security level: {0}")]
    InvalidSecurityLevel(u8),

    /// Ledger data failed decryption, parsing or signature verification.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// A persisted cursor was resumed against a different seed.
    #[error("cursor does not belong to this channel")]
    CursorMismatch,

    /// The channel has no position after this one.
    #[error("channel position {0} has no successor")]
    PositionOverflow(u64),

    #[error("encryption error: {0}")]
    EncryptionError(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
