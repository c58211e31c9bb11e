//! Outbound multi-part splitting.
//!
//! A payload longer than one frame can carry is split into consecutive
//! parts of at most [`MAX_PART_PAYLOAD`] bytes, each framed with the same
//! header and a running `message_number`. The protocol caps a message at
//! nine parts.

use bytes::Bytes;

use crate::{
    header::{FrameError, MAX_PART_PAYLOAD, MAX_PAYLOAD_LEN},
    message::{Message, Payload},
};

/// Split `message` (whose payload is `payload`) into the frames to write.
///
/// Payloads that fit one frame yield a single message with the caller's
/// part fields untouched; larger payloads yield `ceil(len / 9979)` frames
/// with `message_parts` set and `message_number` running from 1.
///
/// # Errors
///
/// Returns [`FrameError::TooLarge`] when the payload would need more than
/// nine parts.
pub(super) fn partition(message: &Message, payload: Bytes) -> Result<Vec<Message>, FrameError> {
    if payload.len() <= MAX_PART_PAYLOAD {
        let mut single = message.clone();
        single.payload = Payload::Raw(payload);
        return Ok(vec![single]);
    }
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(FrameError::TooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD_LEN,
        });
    }

    let parts = payload.len().div_ceil(MAX_PART_PAYLOAD);
    let mut frames = Vec::with_capacity(parts);
    for number in 1..=parts {
        let start = (number - 1) * MAX_PART_PAYLOAD;
        let end = (start + MAX_PART_PAYLOAD).min(payload.len());
        let mut frame = message.clone();
        frame.message_parts = parts as u8;
        frame.message_number = number as u8;
        frame.payload = Payload::Raw(payload.slice(start..end));
        frames.push(frame);
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_payloads_stay_single_frame() {
        let frames = partition(&Message::new(2), Bytes::from_static(b"abc")).expect("fits");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].message_parts, 0);
        assert_eq!(frames[0].message_number, 0);
    }

    #[test]
    fn a_full_single_frame_payload_is_not_split() {
        let payload = Bytes::from(vec![b'x'; MAX_PART_PAYLOAD]);
        let frames = partition(&Message::new(2), payload).expect("fits exactly");
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn forty_five_thousand_bytes_split_into_five_parts() {
        let payload = Bytes::from(vec![b'x'; 45_000]);
        let frames = partition(&Message::new(2), payload.clone()).expect("five parts");

        assert_eq!(frames.len(), 5);
        let mut reassembled = Vec::new();
        for (index, frame) in frames.iter().enumerate() {
            assert_eq!(frame.message_parts, 5);
            assert_eq!(frame.message_number, index as u8 + 1);
            reassembled.extend_from_slice(frame.payload.as_bytes().expect("raw part"));
        }
        assert_eq!(reassembled, payload, "part slices concatenate to the original");
    }

    #[test]
    fn the_nine_part_maximum_is_accepted() {
        let payload = Bytes::from(vec![b'x'; MAX_PAYLOAD_LEN]);
        let frames = partition(&Message::new(2), payload).expect("nine parts fit");
        assert_eq!(frames.len(), 9);
        assert_eq!(frames[8].payload.len(), MAX_PART_PAYLOAD);
    }

    #[test]
    fn payloads_beyond_nine_parts_are_rejected() {
        let payload = Bytes::from(vec![b'x'; MAX_PAYLOAD_LEN + 1]);
        let err = partition(&Message::new(2), payload).expect_err("ten parts");
        assert_eq!(
            err,
            FrameError::TooLarge {
                size: MAX_PAYLOAD_LEN + 1,
                max: MAX_PAYLOAD_LEN,
            }
        );
    }
}
