//! Message decoding and verification.

use serde::{Deserialize, Serialize};

use crate::codec::Trytes;
use crate::error::{CoreError, Result};
use crate::message::{signed_bytes, Envelope, SignedBody, BUNDLE_VERSION};
use crate::mode::ModePolicy;
use crate::ots::OtsSignature;
use crate::types::Root;

/// A verified message as read back from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedMessage {
    pub root: Root,
    pub payload: Trytes,
    pub next_root: Root,
}

/// Open, parse and authenticate a bundle found for `root`.
///
/// Every failure is a [`CoreError::ProtocolViolation`]: a bundle that cannot
/// be read with the given policy is never treated as absent.
pub fn decode(bundle: &[u8], root: &Root, policy: &ModePolicy) -> Result<DecodedMessage> {
    let envelope = Envelope::from_bytes(bundle)?;
    if envelope.version != BUNDLE_VERSION {
        return Err(CoreError::ProtocolViolation(format!(
            "unsupported bundle version {}",
            envelope.version
        )));
    }

    let body = policy.open(root, &envelope.body)?;
    let body = SignedBody::from_bytes(&body)?;

    let signature = OtsSignature {
        security: body.security,
        chains: body.signature,
    };
    signature.verify(&signed_bytes(root, &body.next_root, &body.payload), root)?;

    Ok(DecodedMessage {
        root: *root,
        payload: body.payload,
        next_root: body.next_root,
    })
}
