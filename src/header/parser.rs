//! Header parser: slices framed messages out of a byte stream.
//!
//! The decoder tolerates arbitrary chunk boundaries. Until a complete frame
//! (including its terminator, where one is required) is buffered, it
//! consumes nothing and asks the transport for more bytes; a chunk boundary
//! may fall inside the length field, the header, the payload, or between
//! payload and terminator without observable effect.

use std::io;

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;

use super::{CodecError, FrameError, HEADER_LEN, HeaderCodec};
use crate::message::{MID_TRACE_CURVE, MID_TRACE_PLOT, Message, Payload};

const LENGTH_END: usize = 4;
const MID_END: usize = 8;

impl Decoder for HeaderCodec {
    type Item = Message;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, CodecError> {
        if src.len() < LENGTH_END {
            return Ok(None);
        }
        let length = decode_length(&src[..LENGTH_END])?;

        // Validate the MID before waiting for the rest of the frame so a
        // corrupt stream fails fast instead of stalling on a bogus length.
        if src.len() < MID_END {
            return Ok(None);
        }
        let mid = decode_mid(&src[LENGTH_END..MID_END])?;

        // Trace frames (MID 900/901) are not NUL-terminated.
        let require_terminator = !matches!(mid, MID_TRACE_CURVE | MID_TRACE_PLOT);
        let required = length + usize::from(require_terminator);
        if src.len() < required {
            src.reserve(required - src.len());
            return Ok(None);
        }

        let frame = src.split_to(required).freeze();
        decode_frame(&frame, mid, length, require_terminator, self.raw_data())
            .map(Some)
            .map_err(CodecError::from)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Message>, CodecError> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if src.is_empty() => Ok(None),
            None => Err(CodecError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stream ended with {} bytes of a partial frame", src.len()),
            ))),
        }
    }
}

/// Decode the remaining header fields, payload, and terminator of a fully
/// buffered frame.
fn decode_frame(
    frame: &Bytes,
    mid: u16,
    length: usize,
    require_terminator: bool,
    raw_data: bool,
) -> Result<Message, FrameError> {
    let revision = numeric_field(&frame[8..11], 1)
        .filter(|revision| (1..=999).contains(revision))
        .ok_or_else(|| FrameError::InvalidRevision {
            found: field_text(&frame[8..11]),
        })?;
    let no_ack = match frame[11] {
        b'0' | b' ' => false,
        b'1' => true,
        other => {
            return Err(FrameError::InvalidNoAck {
                found: char::from(other).to_string(),
            });
        }
    };
    let station_id =
        numeric_field(&frame[12..14], 0).ok_or_else(|| FrameError::InvalidStationId {
            found: field_text(&frame[12..14]),
        })?;
    let spindle_id =
        numeric_field(&frame[14..16], 0).ok_or_else(|| FrameError::InvalidSpindleId {
            found: field_text(&frame[14..16]),
        })?;
    let sequence_number =
        numeric_field(&frame[16..18], 0).ok_or_else(|| FrameError::InvalidSequenceNumber {
            found: field_text(&frame[16..18]),
        })?;
    let message_parts = digit_field(frame[18]).ok_or_else(|| FrameError::InvalidMessageParts {
        found: char::from(frame[18]).to_string(),
    })?;
    let message_number = digit_field(frame[19]).ok_or_else(|| FrameError::InvalidMessageNumber {
        found: char::from(frame[19]).to_string(),
    })?;

    let payload = frame.slice(HEADER_LEN..length);
    if require_terminator && frame[length] != 0 {
        return Err(FrameError::InvalidTerminator { mid, length });
    }

    Ok(Message {
        mid,
        revision: revision as u16,
        no_ack,
        station_id: station_id as u8,
        spindle_id: spindle_id as u8,
        sequence_number: sequence_number as u8,
        message_parts,
        message_number,
        payload: Payload::Raw(payload),
        is_ack: false,
        raw: raw_data.then(|| frame.clone()),
    })
}

fn decode_length(bytes: &[u8]) -> Result<usize, FrameError> {
    // A length below the header size cannot frame a valid message.
    ascii_number(bytes)
        .map(|length| length as usize)
        .filter(|length| (HEADER_LEN..=super::MAX_FRAME_LEN).contains(length))
        .ok_or_else(|| FrameError::InvalidLength {
            found: field_text(bytes),
        })
}

fn decode_mid(bytes: &[u8]) -> Result<u16, FrameError> {
    ascii_number(bytes)
        .filter(|mid| (1..=9999).contains(mid))
        .map(|mid| mid as u16)
        .ok_or_else(|| FrameError::InvalidMid {
            found: field_text(bytes),
        })
}

/// Parse an all-digit ASCII field; `None` on any non-digit byte.
fn ascii_number(bytes: &[u8]) -> Option<u32> {
    bytes.iter().try_fold(0_u32, |value, &byte| {
        byte.is_ascii_digit()
            .then(|| value * 10 + u32::from(byte - b'0'))
    })
}

/// Parse a numeric field, substituting `default` when it is all spaces.
fn numeric_field(bytes: &[u8], default: u32) -> Option<u32> {
    if bytes.iter().all(|&byte| byte == b' ') {
        return Some(default);
    }
    ascii_number(bytes)
}

/// Parse a single-digit field, substituting 0 when blank.
fn digit_field(byte: u8) -> Option<u8> {
    match byte {
        b' ' => Some(0),
        b'0'..=b'9' => Some(byte - b'0'),
        _ => None,
    }
}

fn field_text(bytes: &[u8]) -> String { String::from_utf8_lossy(bytes).into_owned() }

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
