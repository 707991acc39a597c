//! Client configuration.

use std::path::Path;

use mam_core::SecurityLevel;
use mam_sync::{FetchConfig, RetryPolicy};
use serde::{Deserialize, Serialize};

use crate::error::{MamError, Result};

/// Configuration for a [`Mam`](crate::Mam) client.
///
/// Every field has a default, so a JSON file only needs the values it
/// changes:
///
/// ```json
/// { "security": 3, "retry": { "max_attempts": 8 }, "fetch": { "max_chain_length": 50 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MamConfig {
    /// Security level of channels created by [`Mam::init`](crate::Mam::init).
    pub security: SecurityLevel,
    /// Retry policy for individual ledger calls.
    pub retry: RetryPolicy,
    /// Chain walking and polling limits.
    pub fetch: FetchConfig,
}

impl MamConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MamError::Config(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| MamError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| MamError::Config(e.to_string()))
    }
}
