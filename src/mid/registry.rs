//! Immutable MID codec registry.
//!
//! The registry is populated once from the registration list below and
//! never mutated afterwards. Unknown MIDs pass through: the parser leaves
//! their payload as raw bytes and the serializer accepts anything
//! byte-like, so unsupported messages still flow end to end.

use std::{collections::HashMap, sync::LazyLock};

use bytes::Bytes;
use log::trace;

use super::{
    MidCodec,
    MidError,
    MidPayload,
    mid0001::CommunicationStartCodec,
    mid0002::CommunicationStartAckCodec,
    mid0003::CommunicationStopCodec,
    mid0004::CommandErrorCodec,
    mid0005::CommandAcceptedCodec,
    mid0061::TighteningResultCodec,
    mid0071::AlarmCodec,
    mid0900::TraceCurveCodec,
};
use crate::message::{MID_COMMAND_ACCEPTED, MID_SUBSCRIBE, MID_UNSUBSCRIBE, Message, Payload};

/// Registration list; every codec the registry serves.
static CODECS: &[&dyn MidCodec] = &[
    &CommunicationStartCodec,
    &CommunicationStartAckCodec,
    &CommunicationStopCodec,
    &CommandErrorCodec,
    &CommandAcceptedCodec,
    &TighteningResultCodec,
    &AlarmCodec,
    &TraceCurveCodec,
];

/// Process-wide registry, built on first use.
pub fn registry() -> &'static Registry {
    static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::with_default_codecs);
    &REGISTRY
}

/// Per-MID parse/serialize dispatch.
pub struct Registry {
    codecs: HashMap<u16, &'static dyn MidCodec>,
}

impl Registry {
    fn with_default_codecs() -> Self {
        let mut codecs = HashMap::with_capacity(CODECS.len());
        for &codec in CODECS {
            let previous = codecs.insert(codec.mid(), codec);
            debug_assert!(previous.is_none(), "duplicate codec for MID {}", codec.mid());
        }
        Self { codecs }
    }

    /// Look up the codec registered for `mid`.
    #[must_use]
    pub fn get(&self, mid: u16) -> Option<&'static dyn MidCodec> {
        self.codecs.get(&mid).copied()
    }

    /// Decode the raw payload of `message` via its registered codec.
    ///
    /// Messages without a registered codec are delivered unchanged, payload
    /// still raw.
    ///
    /// # Errors
    ///
    /// Returns [`MidError::UnsupportedRevision`] when the message revision
    /// is outside the codec's set, or the codec's own parse failure.
    pub fn parse(&self, message: &mut Message) -> Result<(), MidError> {
        let Some(codec) = self.get(message.mid) else {
            trace!("no codec for MID {:04}, delivering raw payload", message.mid);
            return Ok(());
        };
        ensure_revision(codec, message)?;
        codec.parse(message)
    }

    /// Encode the payload of `message` into raw bytes via its registered
    /// codec, applying the ack and subscription rewrite conventions. The
    /// ack rewrite applies to every MID, registered or not.
    ///
    /// # Errors
    ///
    /// Returns [`MidError::NotSubscribable`] for subscription payloads on
    /// non-publish MIDs, [`MidError::UnknownMid`] for structured payloads
    /// without a codec, [`MidError::UnsupportedRevision`] for revisions the
    /// codec does not speak, or the codec's own serialize failure.
    pub fn serialize(&self, message: &mut Message) -> Result<(), MidError> {
        // Ack replies rewrite to MID 5 whether or not the acknowledged MID
        // has a codec of its own.
        if message.is_ack {
            rewrite(message, MID_COMMAND_ACCEPTED);
            return Ok(());
        }
        match self.get(message.mid) {
            Some(codec) => match &message.payload {
                Payload::Decoded(MidPayload::Subscribe) => {
                    ensure_publish(codec, message.mid)?;
                    rewrite(message, MID_SUBSCRIBE);
                    Ok(())
                }
                Payload::Decoded(MidPayload::Unsubscribe) => {
                    ensure_publish(codec, message.mid)?;
                    rewrite(message, MID_UNSUBSCRIBE);
                    Ok(())
                }
                _ => {
                    ensure_revision(codec, message)?;
                    codec.serialize(message)
                }
            },
            None => match &message.payload {
                Payload::Raw(_) | Payload::Empty => Ok(()),
                Payload::Text(text) => {
                    message.payload = Payload::Raw(Bytes::copy_from_slice(text.as_bytes()));
                    Ok(())
                }
                Payload::Decoded(_) => Err(MidError::UnknownMid { mid: message.mid }),
            },
        }
    }
}

fn ensure_revision(codec: &dyn MidCodec, message: &Message) -> Result<(), MidError> {
    if codec.supported_revisions().contains(&message.revision) {
        return Ok(());
    }
    Err(MidError::UnsupportedRevision {
        mid: message.mid,
        revision: message.revision,
    })
}

fn ensure_publish(codec: &dyn MidCodec, mid: u16) -> Result<(), MidError> {
    if codec.is_publish() {
        return Ok(());
    }
    Err(MidError::NotSubscribable { mid })
}

/// Rewrite `message` to `to`, carrying the original MID as four digits.
fn rewrite(message: &mut Message, to: u16) {
    let target = message.mid;
    message.mid = to;
    message.revision = 1;
    message.payload = Payload::Raw(Bytes::from(format!("{target:04}")));
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
