//! In-memory representation of Open Protocol messages.
//!
//! A [`Message`] is created by the caller (outbound) or the header parser
//! (inbound), mutated only by the pipeline stage currently owning it, and
//! released once it has been acknowledged, retired, or delivered upward.

use bytes::Bytes;

use crate::mid::MidPayload;

/// MID 0004, command error.
pub const MID_COMMAND_ERROR: u16 = 4;
/// MID 0005, command accepted. Application-level acks are rewritten to this.
pub const MID_COMMAND_ACCEPTED: u16 = 5;
/// MID 0008, generic subscription request.
pub const MID_SUBSCRIBE: u16 = 8;
/// MID 0009, generic unsubscription request.
pub const MID_UNSUBSCRIBE: u16 = 9;
/// MID 0900, trace curve data. Frames may omit the NUL terminator.
pub const MID_TRACE_CURVE: u16 = 900;
/// MID 0901, trace plot data. Frames may omit the NUL terminator.
pub const MID_TRACE_PLOT: u16 = 901;
/// MID 9997, link-layer positive acknowledge.
pub const MID_POSITIVE_ACK: u16 = 9997;
/// MID 9998, link-layer negative acknowledge.
pub const MID_NEGATIVE_ACK: u16 = 9998;

/// Report whether `mid` is one of the two link-layer acknowledge MIDs.
#[must_use]
pub const fn is_link_ack_mid(mid: u16) -> bool {
    matches!(mid, MID_POSITIVE_ACK | MID_NEGATIVE_ACK)
}

/// Payload carried by a [`Message`].
///
/// Inbound messages start life as [`Payload::Raw`] and are upgraded to
/// [`Payload::Decoded`] by the MID parser. Outbound messages travel the
/// opposite way: the MID serializer lowers structured payloads to raw bytes
/// before the header serializer frames them.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Payload {
    /// Raw payload bytes, exactly as framed on the wire.
    Raw(Bytes),
    /// ASCII text, coerced to bytes by the serializer.
    Text(String),
    /// Structured record produced or consumed by a registered MID codec.
    Decoded(MidPayload),
    /// No payload.
    #[default]
    Empty,
}

impl Payload {
    /// Borrow the payload as bytes, if it has a byte representation.
    ///
    /// Returns `None` for [`Payload::Decoded`]; the MID serializer must run
    /// before the payload can be framed.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Raw(bytes) => Some(bytes.as_ref()),
            Self::Text(text) => Some(text.as_bytes()),
            Self::Decoded(_) => None,
            Self::Empty => Some(&[]),
        }
    }

    /// Copy the payload out as owned [`Bytes`], if it has a byte representation.
    #[must_use]
    pub fn to_bytes(&self) -> Option<Bytes> {
        match self {
            Self::Raw(bytes) => Some(bytes.clone()),
            Self::Text(text) => Some(Bytes::copy_from_slice(text.as_bytes())),
            Self::Decoded(_) => None,
            Self::Empty => Some(Bytes::new()),
        }
    }

    /// Payload length in bytes; zero for structured payloads.
    #[must_use]
    pub fn len(&self) -> usize { self.as_bytes().map_or(0, <[u8]>::len) }

    /// Report whether the payload carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self { Self::Raw(bytes) }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self { Self::Text(text.to_owned()) }
}

impl From<MidPayload> for Payload {
    fn from(payload: MidPayload) -> Self { Self::Decoded(payload) }
}

/// One Open Protocol message, header fields plus payload.
///
/// Field ranges mirror the wire format: `mid` 1..=9999, `revision` 1..=999,
/// `station_id`/`spindle_id`/`sequence_number` 0..=99, `message_parts` and
/// `message_number` 0..=9. The header serializer validates them on encode.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// Message identifier, four wire digits.
    pub mid: u16,
    /// Per-MID schema revision; blank on the wire means 1.
    pub revision: u16,
    /// When set, the peer is asked not to acknowledge this message.
    pub no_ack: bool,
    /// Station (cell) the message addresses.
    pub station_id: u8,
    /// Spindle the message addresses.
    pub spindle_id: u8,
    /// Link-layer sequence number; 0 while the link layer is inactive.
    pub sequence_number: u8,
    /// Total part count of a multi-part message, 0 for single frames.
    pub message_parts: u8,
    /// Position of this frame within a multi-part message.
    pub message_number: u8,
    /// Message body.
    pub payload: Payload,
    /// Marks an application-level ack reply; the link layer emits it
    /// immediately and does not demand an acknowledgement for it.
    pub is_ack: bool,
    /// Original framed bytes, attached only in raw-data mode.
    pub raw: Option<Bytes>,
}

impl Message {
    /// Create a message for `mid` with revision 1 and an empty payload.
    #[must_use]
    pub fn new(mid: u16) -> Self {
        Self {
            mid,
            revision: 1,
            no_ack: false,
            station_id: 0,
            spindle_id: 0,
            sequence_number: 0,
            message_parts: 0,
            message_number: 0,
            payload: Payload::Empty,
            is_ack: false,
            raw: None,
        }
    }

    /// Create a message for `mid` carrying `payload`.
    #[must_use]
    pub fn with_payload(mid: u16, payload: impl Into<Payload>) -> Self {
        Self {
            payload: payload.into(),
            ..Self::new(mid)
        }
    }

    /// Build a subscription request for a publish-type MID.
    ///
    /// The MID serializer rewrites it to [`MID_SUBSCRIBE`] with the target
    /// MID as four ASCII digits in the payload.
    #[must_use]
    pub fn subscribe(mid: u16) -> Self { Self::with_payload(mid, MidPayload::Subscribe) }

    /// Build an unsubscription request for a publish-type MID.
    #[must_use]
    pub fn unsubscribe(mid: u16) -> Self { Self::with_payload(mid, MidPayload::Unsubscribe) }

    /// Build the application-level acknowledgement for a received message.
    ///
    /// The MID serializer rewrites it to [`MID_COMMAND_ACCEPTED`] carrying
    /// the original MID as four ASCII digits.
    #[must_use]
    pub fn ack_for(received: &Self) -> Self {
        Self {
            is_ack: true,
            ..Self::new(received.mid)
        }
    }

    /// Report whether the link layer treats this message as an acknowledge.
    #[must_use]
    pub fn is_acknowledge(&self) -> bool { self.is_ack || is_link_ack_mid(self.mid) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_message_defaults_to_revision_one_and_empty_payload() {
        let message = Message::new(61);
        assert_eq!(message.mid, 61);
        assert_eq!(message.revision, 1);
        assert_eq!(message.sequence_number, 0);
        assert!(message.payload.is_empty());
        assert!(!message.is_acknowledge());
    }

    #[test]
    fn ack_for_marks_the_reply_as_acknowledge() {
        let received = Message::new(61);
        let ack = Message::ack_for(&received);
        assert_eq!(ack.mid, 61);
        assert!(ack.is_ack);
        assert!(ack.is_acknowledge());
    }

    #[test]
    fn link_ack_mids_are_acknowledges_without_the_flag() {
        assert!(Message::new(MID_POSITIVE_ACK).is_acknowledge());
        assert!(Message::new(MID_NEGATIVE_ACK).is_acknowledge());
        assert!(!Message::new(2).is_acknowledge());
    }

    #[test]
    fn payload_text_exposes_bytes() {
        let payload = Payload::from("8787");
        assert_eq!(payload.as_bytes(), Some(b"8787".as_slice()));
        assert_eq!(payload.len(), 4);
    }

    #[test]
    fn decoded_payload_has_no_byte_representation() {
        let payload = Payload::Decoded(MidPayload::Subscribe);
        assert!(payload.as_bytes().is_none());
        assert!(payload.to_bytes().is_none());
    }
}
