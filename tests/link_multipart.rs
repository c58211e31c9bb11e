//! Multi-part reassembly, splitting, and the oversize rejection path.

mod common;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use torqlink::{
    LinkActor,
    LinkError,
    LinkOptions,
    Message,
    Payload,
    header::{MAX_PART_PAYLOAD, MAX_PAYLOAD_LEN},
    mid::MidPayload,
};

use crate::common::{build_frame, read_frame};

#[tokio::test]
async fn three_parts_reassemble_into_one_decoded_message() {
    let (transport, mut peer) = tokio::io::duplex(4096);
    let (actor, handle, mut channels) = LinkActor::new(transport, LinkOptions::default());
    let driver = tokio::spawn(actor.run());

    let payload: &[u8] = b"010001020103Teste Airbag             ";
    for (number, chunk) in [&payload[..10], &payload[10..23], &payload[23..]]
        .into_iter()
        .enumerate()
    {
        let frame = build_frame(2, 0, 3, number as u8 + 1, chunk);
        peer.write_all(&frame).await.expect("peer writes part");
    }

    let message = channels.messages.recv().await.expect("one reassembled message");
    assert_eq!(message.mid, 2);
    assert_eq!(message.message_parts, 3);
    assert_eq!(message.message_number, 3);
    let Payload::Decoded(MidPayload::CommunicationStartAck(ack)) = &message.payload else {
        panic!("expected a decoded payload, got {:?}", message.payload);
    };
    assert_eq!(ack.controller_name, "Teste Airbag");

    handle.destroy();
    driver.await.expect("driver task").expect("clean shutdown");
}

#[tokio::test]
async fn out_of_order_parts_surface_errors_and_deliver_nothing() {
    let (transport, mut peer) = tokio::io::duplex(4096);
    let (actor, handle, mut channels) = LinkActor::new(transport, LinkOptions::default());
    let driver = tokio::spawn(actor.run());

    for _ in 0..2 {
        let frame = build_frame(2, 0, 3, 3, b"tail");
        peer.write_all(&frame).await.expect("peer writes stray part");
    }

    for _ in 0..2 {
        let err = channels.errors.recv().await.expect("violation surfaces");
        assert!(
            matches!(err, LinkError::InconsistencyMessageNumber { expected: 1, actual: 3 }),
            "got {err:?}"
        );
    }
    assert!(
        channels.messages.try_recv().is_err(),
        "no message is delivered from stray parts"
    );

    handle.destroy();
    driver.await.expect("driver task").expect("clean shutdown");
}

#[tokio::test]
async fn large_outbound_payloads_split_into_consecutive_parts() {
    let (transport, mut peer) = tokio::io::duplex(256 * 1024);
    let (actor, handle, _channels) = LinkActor::new(transport, LinkOptions::default());
    let driver = tokio::spawn(actor.run());

    let payload: Vec<u8> = (0..45_000_u32).map(|i| b'a' + (i % 23) as u8).collect();
    handle
        .write(Message::with_payload(150, Payload::Raw(Bytes::from(payload.clone()))))
        .await
        .expect("inactive-mode write resolves after writing");

    let mut reassembled = Vec::new();
    for number in 1..=5_u8 {
        let frame = read_frame(&mut peer).await;
        let expected_len = if number < 5 { 9_999 } else { 45_000 - 4 * MAX_PART_PAYLOAD + 20 };
        assert_eq!(&frame[..4], format!("{expected_len:04}").as_bytes());
        assert_eq!(&frame[4..8], b"0150");
        assert_eq!(frame[18], b'5', "all parts declare five parts");
        assert_eq!(frame[19], b'0' + number, "part numbers run from one");
        reassembled.extend_from_slice(&frame[20..frame.len() - 1]);
    }
    assert_eq!(reassembled, payload, "part payloads concatenate to the original");

    handle.destroy();
    driver.await.expect("driver task").expect("clean shutdown");
}

#[tokio::test]
async fn payloads_beyond_nine_parts_are_rejected_before_the_transport() {
    let (transport, mut peer) = tokio::io::duplex(4096);
    let (actor, handle, mut channels) = LinkActor::new(transport, LinkOptions::default());
    let driver = tokio::spawn(actor.run());

    let oversize = vec![b'x'; 112_264];
    let err = handle
        .write(Message::with_payload(150, Payload::Raw(Bytes::from(oversize))))
        .await
        .expect_err("payload exceeds the protocol maximum");
    assert!(
        matches!(
            err,
            LinkError::Frame(torqlink::header::FrameError::TooLarge {
                size: 112_264,
                max: MAX_PAYLOAD_LEN,
            })
        ),
        "got {err:?}"
    );

    let event = channels.errors.recv().await.expect("oversize surfaces as an event");
    assert!(
        matches!(event, LinkError::Frame(torqlink::header::FrameError::TooLarge { .. })),
        "got {event:?}"
    );

    // Nothing reached the transport: the very next frame the peer sees is
    // a probe written afterwards.
    handle
        .write(Message::with_payload(9999, "alive"))
        .await
        .expect("probe write");
    let frame = read_frame(&mut peer).await;
    assert_eq!(&frame[4..8], b"9999");

    handle.destroy();
    driver.await.expect("driver task").expect("clean shutdown");
}
