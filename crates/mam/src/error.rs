//! Error types for channel operations.
//!
//! Errors from the layers below are flattened into one taxonomy so callers
//! can match on what went wrong rather than where.

use mam_core::CoreError;
use mam_store::StoreError;
use mam_sync::SyncError;
use thiserror::Error;

/// Errors that can occur during MAM operations.
#[derive(Debug, Error)]
pub enum MamError {
    /// Restricted mode without a usable side key, or a side key override
    /// on a channel that is not restricted.
    #[error("invalid mode configuration: {0}")]
    InvalidModeConfiguration(String),

    /// A restricted channel was fetched without a side key.
    #[error("missing side key for restricted channel")]
    MissingSideKey,

    /// A payload or key is not representable in the tryte alphabet.
    #[error("encoding error: {0}")]
    EncodingError(String),

    /// The ledger was unreachable or behind. Recoverable by retrying.
    #[error("transient ledger failure after {attempts} attempts: {message}")]
    TransientFailure { attempts: u32, message: String },

    /// Ledger data failed authentication.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// A poll or ledger call ran out of time.
    #[error("timeout: {0}")]
    Timeout(String),

    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    #[error("invalid security level: {0}")]
    InvalidSecurityLevel(u8),

    /// A saved cursor belongs to a different seed.
    #[error("cursor does not belong to this channel")]
    CursorMismatch,

    /// The channel has no position after this one.
    #[error("channel position {0} has no successor")]
    PositionOverflow(u64),

    #[error("cipher error: {0}")]
    Cipher(String),

    /// Storage error that retrying will not fix.
    #[error("storage error: {0}")]
    Store(StoreError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl MamError {
    /// Whether retrying the operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, MamError::TransientFailure { .. } | MamError::Timeout(_))
    }
}

impl From<CoreError> for MamError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidModeConfiguration(m) => MamError::InvalidModeConfiguration(m),
            CoreError::MissingSideKey => MamError::MissingSideKey,
            CoreError::EncodingError(m) => MamError::EncodingError(m),
            CoreError::InvalidSeed(m) => MamError::InvalidSeed(m),
            CoreError::InvalidSecurityLevel(level) => MamError::InvalidSecurityLevel(level),
            CoreError::ProtocolViolation(m) => MamError::ProtocolViolation(m),
            CoreError::CursorMismatch => MamError::CursorMismatch,
            CoreError::PositionOverflow(position) => MamError::PositionOverflow(position),
            CoreError::EncryptionError(m) => MamError::Cipher(m),
        }
    }
}

impl From<SyncError> for MamError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::Core(core) => core.into(),
            SyncError::Store(store) => MamError::Store(store),
            SyncError::TransientFailure { attempts, message } => {
                MamError::TransientFailure { attempts, message }
            }
            SyncError::Timeout(m) => MamError::Timeout(m),
        }
    }
}

impl From<StoreError> for MamError {
    fn from(e: StoreError) -> Self {
        if e.is_transient() {
            MamError::TransientFailure {
                attempts: 1,
                message: e.to_string(),
            }
        } else {
            MamError::Store(e)
        }
    }
}

/// Result type for MAM operations.
pub type Result<T> = std::result::Result<T, MamError>;
