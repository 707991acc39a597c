//! Publisher: hands created messages to the ledger.

use mam_core::Message;
use mam_store::{AttachReceipt, AttachStatus, Ledger};
use tracing::{debug, info};

use crate::config::RetryPolicy;
use crate::error::Result;
use crate::retry::with_retry;

/// Attaches messages to a ledger, retrying transient failures.
pub struct Publisher<L: Ledger> {
    ledger: L,
    retry: RetryPolicy,
}

impl<L: Ledger> Publisher<L> {
    pub fn new(ledger: L, retry: RetryPolicy) -> Self {
        Self { ledger, retry }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Attach `message.bundle` at `message.address`.
    ///
    /// Re-attaching the same message is harmless: the ledger reports it as
    /// already attached.
    pub async fn attach(&self, message: &Message) -> Result<AttachReceipt> {
        debug!(
            position = message.position,
            address = %message.address,
            bytes = message.bundle.len(),
            "attaching message"
        );

        let receipt = with_retry(&self.retry, "attach", || {
            self.ledger.attach(&message.address, message.bundle.clone())
        })
        .await?;

        if receipt.status == AttachStatus::Attached {
            info!(position = message.position, address = %message.address, "message attached");
        }
        Ok(receipt)
    }
}
