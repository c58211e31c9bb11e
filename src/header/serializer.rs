//! Header serializer: frames a message for the wire.
//!
//! [`encode_frame`] is a pure function with no I/O and no state. It accepts
//! the same field defaults the parser produces, so serializing a parsed
//! message reproduces the original frame.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Encoder;

use super::{CodecError, FrameError, HEADER_LEN, HeaderCodec, MAX_PART_PAYLOAD};
use crate::message::{MID_TRACE_CURVE, MID_TRACE_PLOT, Message};

/// Encode `message` into a single framed byte sequence.
///
/// Numeric header fields are written zero-padded; the payload is followed by
/// a NUL terminator except for trace frames (MID 900/901), which the
/// protocol allows to omit it and controllers expect without it.
///
/// # Errors
///
/// Returns the field-specific [`FrameError`] for any out-of-range header
/// field, [`FrameError::InvalidPayload`] when the payload has no byte
/// representation, and [`FrameError::TooLarge`] when the payload exceeds
/// what a single frame can carry (multi-part splitting happens upstream in
/// the link layer).
pub fn encode_frame(message: &Message) -> Result<Bytes, FrameError> {
    let payload = message
        .payload
        .as_bytes()
        .ok_or(FrameError::InvalidPayload { mid: message.mid })?;

    validate_header(message)?;
    if payload.len() > MAX_PART_PAYLOAD {
        return Err(FrameError::TooLarge {
            size: payload.len(),
            max: MAX_PART_PAYLOAD,
        });
    }

    let length = HEADER_LEN + payload.len();
    let terminator = !matches!(message.mid, MID_TRACE_CURVE | MID_TRACE_PLOT);
    let mut buf = BytesMut::with_capacity(length + usize::from(terminator));
    put_number(&mut buf, length, 4);
    put_number(&mut buf, usize::from(message.mid), 4);
    put_number(&mut buf, usize::from(message.revision), 3);
    buf.extend_from_slice(if message.no_ack { b"1" } else { b"0" });
    put_number(&mut buf, usize::from(message.station_id), 2);
    put_number(&mut buf, usize::from(message.spindle_id), 2);
    put_number(&mut buf, usize::from(message.sequence_number), 2);
    put_number(&mut buf, usize::from(message.message_parts), 1);
    put_number(&mut buf, usize::from(message.message_number), 1);
    buf.extend_from_slice(payload);
    if terminator {
        buf.extend_from_slice(&[0]);
    }
    Ok(buf.freeze())
}

fn validate_header(message: &Message) -> Result<(), FrameError> {
    if !(1..=9999).contains(&message.mid) {
        return Err(FrameError::InvalidMid {
            found: message.mid.to_string(),
        });
    }
    if !(1..=999).contains(&message.revision) {
        return Err(FrameError::InvalidRevision {
            found: message.revision.to_string(),
        });
    }
    if message.station_id > 99 {
        return Err(FrameError::InvalidStationId {
            found: message.station_id.to_string(),
        });
    }
    if message.spindle_id > 99 {
        return Err(FrameError::InvalidSpindleId {
            found: message.spindle_id.to_string(),
        });
    }
    if message.sequence_number > 99 {
        return Err(FrameError::InvalidSequenceNumber {
            found: message.sequence_number.to_string(),
        });
    }
    if message.message_parts > 9 {
        return Err(FrameError::InvalidMessageParts {
            found: message.message_parts.to_string(),
        });
    }
    if message.message_number > 9 {
        return Err(FrameError::InvalidMessageNumber {
            found: message.message_number.to_string(),
        });
    }
    Ok(())
}

fn put_number(buf: &mut BytesMut, value: usize, width: usize) {
    buf.extend_from_slice(format!("{value:0width$}").as_bytes());
}

impl Encoder<Message> for HeaderCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), CodecError> {
        let frame = encode_frame(&item)?;
        dst.extend_from_slice(&frame);
        Ok(())
    }
}

#[cfg(test)]
#[path = "serializer_tests.rs"]
mod tests;
