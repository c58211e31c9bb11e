//! Property tests for the framing codec: chunk-boundary idempotence and
//! parse/serialize round-trips.

use bytes::{Bytes, BytesMut};
use proptest::prelude::*;
use tokio_util::codec::Decoder;
use torqlink::{
    Message,
    Payload,
    header::{HeaderCodec, encode_frame},
};

fn message_strategy() -> impl Strategy<Value = Message> {
    (
        1..=9999_u16,
        1..=999_u16,
        any::<bool>(),
        0..=99_u8,
        0..=99_u8,
        0..=99_u8,
        0..=9_u8,
        0..=9_u8,
        proptest::collection::vec(any::<u8>(), 0..200),
    )
        .prop_map(
            |(mid, revision, no_ack, station, spindle, sequence, parts, number, payload)| {
                let mut message = Message::with_payload(mid, Payload::Raw(Bytes::from(payload)));
                message.revision = revision;
                message.no_ack = no_ack;
                message.station_id = station;
                message.spindle_id = spindle;
                message.sequence_number = sequence;
                message.message_parts = parts;
                message.message_number = number;
                message
            },
        )
}

fn decode_stream(stream: &[u8], chunk_sizes: &[usize]) -> Vec<Message> {
    let mut codec = HeaderCodec::new();
    let mut buf = BytesMut::new();
    let mut messages = Vec::new();
    let mut offset = 0;
    let mut turn = 0;

    while offset < stream.len() {
        let size = chunk_sizes[turn % chunk_sizes.len()].max(1);
        let end = (offset + size).min(stream.len());
        buf.extend_from_slice(&stream[offset..end]);
        offset = end;
        turn += 1;

        while let Some(message) = codec.decode(&mut buf).expect("valid stream decodes") {
            messages.push(message);
        }
    }
    assert!(buf.is_empty(), "a whole stream leaves no carry bytes");
    messages
}

proptest! {
    /// Any chunking of a valid stream parses to the same message sequence,
    /// and parsing undoes serializing.
    #[test]
    fn chunk_boundaries_never_change_the_parse(
        messages in proptest::collection::vec(message_strategy(), 1..5),
        chunk_sizes in proptest::collection::vec(1_usize..64, 1..8),
    ) {
        let mut stream = Vec::new();
        for message in &messages {
            stream.extend_from_slice(&encode_frame(message).expect("in-range message encodes"));
        }

        let chunked = decode_stream(&stream, &chunk_sizes);
        let whole = decode_stream(&stream, &[stream.len()]);

        prop_assert_eq!(&chunked, &messages);
        prop_assert_eq!(&whole, &messages);
    }
}
