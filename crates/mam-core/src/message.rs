//! Message building.
//!
//! A message is a signed body (payload, the next root, the one-time
//! signature) sealed per mode and wrapped in a versioned envelope. The
//! resulting bundle is what the ledger stores at the message's address.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::channel::ChannelState;
use crate::codec::Trytes;
use crate::error::{CoreError, Result};
use crate::mode::ModePolicy;
use crate::ots::OtsKey;
use crate::types::{Address, Root, SecurityLevel, SideKey};

/// Current bundle format.
pub const BUNDLE_VERSION: u8 = 1;

/// Outer wrapper of every bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub version: u8,
    /// CBOR [`SignedBody`], sealed unless the channel is public.
    pub body: Bytes,
}

impl Envelope {
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| CoreError::EncodingError(e.to_string()))?;
        Ok(Bytes::from(buf))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes)
            .map_err(|e| CoreError::ProtocolViolation(format!("malformed envelope: {}", e)))
    }
}

/// Authenticated content of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBody {
    pub payload: Trytes,
    pub next_root: Root,
    pub security: SecurityLevel,
    pub signature: Vec<[u8; 32]>,
}

impl SignedBody {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| CoreError::EncodingError(e.to_string()))?;
        Ok(buf)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes)
            .map_err(|e| CoreError::ProtocolViolation(format!("malformed message body: {}", e)))
    }
}

/// Bytes covered by the one-time signature.
///
/// Binding the root ties the signature to one position; binding the next
/// root stops a relay from splicing in another chain.
pub(crate) fn signed_bytes(root: &Root, next_root: &Root, payload: &Trytes) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64 + payload.len());
    buf.extend_from_slice(root.as_bytes());
    buf.extend_from_slice(next_root.as_bytes());
    buf.extend_from_slice(payload.as_str().as_bytes());
    buf
}

/// A message ready to attach, plus the state to continue publishing from.
#[derive(Debug, Clone)]
pub struct Message {
    /// Position the message was created at.
    pub position: u64,
    pub address: Address,
    pub root: Root,
    pub next_root: Root,
    /// Encoded ledger bytes.
    pub bundle: Bytes,
    /// Channel state advanced past this message.
    pub state: ChannelState,
}

/// Builds the message for the current position of a channel.
///
/// ```ignore
/// let message = MessageBuilder::new(&state, encode_str("HELLO"))
///     .side_key(SideKey::new("NEWKEY")?)
///     .build()?;
/// ```
pub struct MessageBuilder<'a> {
    state: &'a ChannelState,
    payload: Trytes,
    side_key: Option<SideKey>,
}

impl<'a> MessageBuilder<'a> {
    pub fn new(state: &'a ChannelState, payload: Trytes) -> Self {
        Self {
            state,
            payload,
            side_key: None,
        }
    }

    /// Use a different side key for this message only.
    ///
    /// The channel's stored key is kept for later messages. Only valid on
    /// restricted channels.
    pub fn side_key(mut self, side_key: SideKey) -> Self {
        self.side_key = Some(side_key);
        self
    }

    pub fn build(self) -> Result<Message> {
        let policy = match self.side_key {
            Some(side_key) => self.state.policy().with_side_key(side_key)?,
            None => self.state.policy().clone(),
        };
        seal_message(self.state, &policy, self.payload)
    }
}

/// Package `payload` at the channel's current position.
pub fn create(state: &ChannelState, payload: Trytes) -> Result<Message> {
    MessageBuilder::new(state, payload).build()
}

fn seal_message(state: &ChannelState, policy: &ModePolicy, payload: Trytes) -> Result<Message> {
    let root = state.current_root();
    let next_root = state.next_root();
    let address = policy.address(&root);

    let key = OtsKey::derive(state.seed(), state.position(), state.security());
    let signature = key.sign(&signed_bytes(&root, &next_root, &payload));

    let body = SignedBody {
        payload,
        next_root,
        security: signature.security,
        signature: signature.chains,
    }
    .to_bytes()?;

    let bundle = Envelope {
        version: BUNDLE_VERSION,
        body: Bytes::from(policy.seal(&root, &body)?),
    }
    .to_bytes()?;

    Ok(Message {
        position: state.position(),
        address,
        root,
        next_root,
        bundle,
        state: state.advance()?,
    })
}
