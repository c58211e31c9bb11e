//! Tests for frame slicing, field defaults, and chunk-boundary behaviour.

use bytes::BytesMut;
use rstest::rstest;
use tokio_util::codec::Decoder;

use super::*;
use crate::message::{Message, Payload};

const ACK_FRAME: &[u8] = b"00249997001     02  0001\0";
const DATA_FRAME: &[u8] = b"00570002001     01  010001020103Teste Airbag             \0";

fn decode_one(codec: &mut HeaderCodec, bytes: &[u8]) -> Result<Option<Message>, CodecError> {
    let mut buf = BytesMut::from(bytes);
    codec.decode(&mut buf)
}

fn expect_frame_error(result: Result<Option<Message>, CodecError>) -> FrameError {
    match result {
        Err(CodecError::Frame(err)) => err,
        other => panic!("expected a frame error, got {other:?}"),
    }
}

#[test]
fn parses_ack_frame_with_blank_field_defaults() {
    let mut codec = HeaderCodec::new();
    let message = decode_one(&mut codec, ACK_FRAME)
        .expect("frame should parse")
        .expect("frame is complete");

    assert_eq!(message.mid, 9997);
    assert_eq!(message.revision, 1);
    assert!(!message.no_ack);
    assert_eq!(message.station_id, 0);
    assert_eq!(message.spindle_id, 0);
    assert_eq!(message.sequence_number, 2);
    assert_eq!(message.message_parts, 0);
    assert_eq!(message.message_number, 0);
    assert_eq!(message.payload, Payload::Raw(bytes::Bytes::from_static(b"0001")));
    assert!(message.raw.is_none());
}

#[test]
fn parses_consecutive_frames_from_one_buffer() {
    let mut codec = HeaderCodec::new();
    let mut buf = BytesMut::new();
    buf.extend_from_slice(ACK_FRAME);
    buf.extend_from_slice(DATA_FRAME);

    let first = codec.decode(&mut buf).expect("first frame parses");
    let second = codec.decode(&mut buf).expect("second frame parses");
    let third = codec.decode(&mut buf).expect("empty buffer is not an error");

    assert_eq!(first.expect("first frame").mid, 9997);
    assert_eq!(second.expect("second frame").mid, 2);
    assert!(third.is_none());
    assert!(buf.is_empty());
}

#[test]
fn byte_at_a_time_delivery_parses_the_same_frame() {
    let mut codec = HeaderCodec::new();
    let mut buf = BytesMut::new();
    let mut parsed = None;

    for &byte in DATA_FRAME {
        assert!(parsed.is_none(), "no frame before the final byte");
        buf.extend_from_slice(&[byte]);
        parsed = codec.decode(&mut buf).expect("partial frames never error");
    }

    let message = parsed.expect("final byte completes the frame");
    assert_eq!(message.mid, 2);
    assert_eq!(message.sequence_number, 1);
    assert_eq!(
        message.payload.as_bytes(),
        Some(b"010001020103Teste Airbag             ".as_slice())
    );
    assert!(buf.is_empty());
}

#[test]
fn rewinds_without_consuming_when_the_frame_is_incomplete() {
    let mut codec = HeaderCodec::new();
    let mut buf = BytesMut::from(&DATA_FRAME[..30]);

    assert!(codec.decode(&mut buf).expect("incomplete is not an error").is_none());
    assert_eq!(buf.len(), 30, "no bytes consumed before the frame completes");
}

#[test]
fn trace_frame_parses_without_terminator() {
    let mut codec = HeaderCodec::new();
    let frame = b"00300900001000000000TRACEBYTES";
    let mut buf = BytesMut::from(frame.as_slice());

    let message = codec
        .decode(&mut buf)
        .expect("trace frame parses")
        .expect("frame is complete");

    assert_eq!(message.mid, 900);
    assert_eq!(message.payload.as_bytes(), Some(b"TRACEBYTES".as_slice()));
    assert!(buf.is_empty(), "no terminator byte is awaited for MID 900");
}

#[test]
fn missing_terminator_is_rejected() {
    let mut codec = HeaderCodec::new();
    // The NUL slot holds the first byte of a following frame instead.
    let mut frame = DATA_FRAME[..DATA_FRAME.len() - 1].to_vec();
    frame.push(b'0');

    let err = expect_frame_error(decode_one(&mut codec, &frame));
    assert_eq!(err, FrameError::InvalidTerminator { mid: 2, length: 57 });
}

#[test]
fn raw_data_mode_attaches_the_original_frame() {
    let mut codec = HeaderCodec::with_raw_data(true);
    let message = decode_one(&mut codec, ACK_FRAME)
        .expect("frame should parse")
        .expect("frame is complete");

    assert_eq!(message.raw.as_deref(), Some(ACK_FRAME));
}

#[rstest]
#[case::non_numeric_length(b"00ab9997001000000000\0".as_slice())]
#[case::length_below_header(b"00190001001000000000\0".as_slice())]
#[case::zero_length(b"00000001001000000000\0".as_slice())]
fn invalid_length_fields_are_rejected(#[case] frame: &[u8]) {
    let mut codec = HeaderCodec::new();
    let err = expect_frame_error(decode_one(&mut codec, frame));
    assert!(matches!(err, FrameError::InvalidLength { .. }), "got {err:?}");
}

#[rstest]
#[case::zero_mid(b"00200000001000000100\0".as_slice())]
#[case::non_numeric_mid(b"002000x1001000000100\0".as_slice())]
fn invalid_mid_fields_are_rejected(#[case] frame: &[u8]) {
    let mut codec = HeaderCodec::new();
    let err = expect_frame_error(decode_one(&mut codec, frame));
    assert!(matches!(err, FrameError::InvalidMid { .. }), "got {err:?}");
}

#[test]
fn invalid_revision_is_rejected() {
    let frame = b"00240001 x1000000100abcd\0";
    let mut codec = HeaderCodec::new();
    let err = expect_frame_error(decode_one(&mut codec, frame));
    assert!(matches!(err, FrameError::InvalidRevision { .. }), "got {err:?}");
}

#[rstest]
#[case::no_ack(11, b'x')]
#[case::station(12, b'x')]
#[case::spindle(14, b'x')]
#[case::sequence(16, b'x')]
#[case::parts(18, b'x')]
#[case::number(19, b'x')]
fn corrupt_header_bytes_raise_field_specific_errors(#[case] index: usize, #[case] byte: u8) {
    let mut frame = b"00240001001000000100abcd\0".to_vec();
    frame[index] = byte;

    let mut codec = HeaderCodec::new();
    let err = expect_frame_error(decode_one(&mut codec, &frame));
    let matched = match index {
        11 => matches!(err, FrameError::InvalidNoAck { .. }),
        12 => matches!(err, FrameError::InvalidStationId { .. }),
        14 => matches!(err, FrameError::InvalidSpindleId { .. }),
        16 => matches!(err, FrameError::InvalidSequenceNumber { .. }),
        18 => matches!(err, FrameError::InvalidMessageParts { .. }),
        _ => matches!(err, FrameError::InvalidMessageNumber { .. }),
    };
    assert!(matched, "index {index} raised {err:?}");
}

#[test]
fn eof_with_a_partial_frame_is_an_unexpected_eof() {
    let mut codec = HeaderCodec::new();
    let mut buf = BytesMut::from(&DATA_FRAME[..25]);

    let err = codec.decode_eof(&mut buf).expect_err("partial frame at EOF");
    assert!(matches!(err, CodecError::Io(err) if err.kind() == std::io::ErrorKind::UnexpectedEof));
}

#[test]
fn eof_at_a_frame_boundary_is_clean() {
    let mut codec = HeaderCodec::new();
    let mut buf = BytesMut::new();
    assert!(codec.decode_eof(&mut buf).expect("clean close").is_none());
}
