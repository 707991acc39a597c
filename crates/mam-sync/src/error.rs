//! Error types for publishing and fetching.

use mam_core::CoreError;
use mam_store::StoreError;
use thiserror::Error;

/// Errors that can occur while talking to the ledger.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Message encoding, mode configuration or authentication failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The ledger failed in a way retrying will not fix.
    #[error("ledger error: {0}")]
    Store(StoreError),

    /// The ledger kept failing transiently until the retry budget ran out.
    /// Calling again later may succeed.
    #[error("transient failure after {attempts} attempts: {message}")]
    TransientFailure { attempts: u32, message: String },

    /// An operation or poll did not finish within its time budget.
    #[error("timeout: {0}")]
    Timeout(String),
}

impl From<StoreError> for SyncError {
    fn from(e: StoreError) -> Self {
        if e.is_transient() {
            SyncError::TransientFailure {
                attempts: 1,
                message: e.to_string(),
            }
        } else {
            SyncError::Store(e)
        }
    }
}

impl SyncError {
    /// Whether the caller may retry the whole operation later.
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::TransientFailure { .. } | SyncError::Timeout(_))
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
