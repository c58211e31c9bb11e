//! Inbound multi-part reassembly.
//!
//! Parts of a multi-part message must arrive strictly in order, numbered
//! from 1. A mismatched part number discards the partial buffer; the
//! caller NACKs the peer and surfaces the violation.

use bytes::BytesMut;

use crate::message::{Message, Payload};

/// Part-number violation reported to the peer and the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct PartMismatch {
    /// Part number expected next.
    pub(super) expected: u8,
    /// Part number received.
    pub(super) actual: u8,
}

/// In-order accumulator for one multi-part message.
///
/// Only one message reassembles at a time; the protocol interleaves
/// nothing between the parts of a message.
#[derive(Debug, Default)]
pub(super) struct PartAssembly {
    expected: u8,
    payload: BytesMut,
    raw: BytesMut,
}

impl PartAssembly {
    pub(super) fn new() -> Self { Self::default() }

    /// Feed one frame of a multi-part message.
    ///
    /// Returns the reassembled message once the final part arrives, `None`
    /// while parts are outstanding. The reassembled message keeps the final
    /// frame's header, the concatenated payload bytes, and, when raw
    /// frames are attached, the concatenated frame bytes.
    pub(super) fn accept(&mut self, frame: Message) -> Result<Option<Message>, PartMismatch> {
        let expected = self.next_expected();
        if frame.message_number != expected {
            self.discard();
            return Err(PartMismatch {
                expected,
                actual: frame.message_number,
            });
        }

        if let Some(bytes) = frame.payload.as_bytes() {
            self.payload.extend_from_slice(bytes);
        }
        if let Some(raw) = &frame.raw {
            self.raw.extend_from_slice(raw);
        }

        if frame.message_number < frame.message_parts {
            self.expected = frame.message_number;
            return Ok(None);
        }

        let payload = std::mem::take(&mut self.payload).freeze();
        let raw = std::mem::take(&mut self.raw);
        self.expected = 0;
        Ok(Some(Message {
            payload: Payload::Raw(payload),
            raw: frame.raw.is_some().then(|| raw.freeze()),
            ..frame
        }))
    }

    /// Drop any partially assembled message.
    pub(super) fn discard(&mut self) {
        self.expected = 0;
        self.payload.clear();
        self.raw.clear();
    }

    fn next_expected(&self) -> u8 { self.expected + 1 }
}
