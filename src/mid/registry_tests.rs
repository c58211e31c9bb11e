//! Tests for registry dispatch, pass-through, and the rewrite conventions.

use bytes::Bytes;

use super::*;
use crate::{
    message::{MID_COMMAND_ERROR, MID_POSITIVE_ACK},
    mid::CommunicationStartAck,
};

#[test]
fn unknown_mids_pass_through_both_ways() {
    let mut inbound = Message::with_payload(7404, Payload::Raw(Bytes::from_static(b"opaque")));
    registry().parse(&mut inbound).expect("unknown MIDs parse");
    assert_eq!(inbound.payload.as_bytes(), Some(b"opaque".as_slice()));

    let mut outbound = Message::with_payload(7404, Payload::Raw(Bytes::from_static(b"opaque")));
    registry().serialize(&mut outbound).expect("unknown MIDs serialize");
    assert_eq!(outbound.payload.as_bytes(), Some(b"opaque".as_slice()));
}

#[test]
fn text_payloads_are_lowered_to_raw_bytes() {
    let mut message = Message::with_payload(9999, "keep alive");
    registry().serialize(&mut message).expect("text serializes");
    assert_eq!(message.payload, Payload::Raw(Bytes::from_static(b"keep alive")));
}

#[test]
fn structured_payload_for_an_unknown_mid_is_rejected() {
    let mut message = Message::with_payload(
        7404,
        Payload::Decoded(MidPayload::CommunicationStartAck(CommunicationStartAck {
            cell_id: 1,
            channel_id: 1,
            controller_name: String::new(),
        })),
    );
    let err = registry().serialize(&mut message).expect_err("no codec");
    assert_eq!(err, MidError::UnknownMid { mid: 7404 });
}

#[test]
fn parse_dispatches_to_the_registered_codec() {
    let mut message = Message::with_payload(
        2,
        Payload::Raw(Bytes::from_static(b"010001020103Teste Airbag             ")),
    );
    registry().parse(&mut message).expect("MID 2 parses");
    assert!(matches!(
        message.payload,
        Payload::Decoded(MidPayload::CommunicationStartAck(_))
    ));
}

#[test]
fn unsupported_revision_is_rejected_before_the_codec_runs() {
    let mut message = Message::with_payload(2, Payload::Raw(Bytes::from_static(b"garbage")));
    message.revision = 99;
    let err = registry().parse(&mut message).expect_err("revision 99 unknown");
    assert_eq!(err, MidError::UnsupportedRevision { mid: 2, revision: 99 });
}

#[test]
fn ack_replies_are_rewritten_to_command_accepted() {
    let received = Message::new(61);
    let mut ack = Message::ack_for(&received);
    registry().serialize(&mut ack).expect("ack serializes");

    assert_eq!(ack.mid, 5);
    assert!(ack.is_ack, "the link layer still fast-paths the rewritten ack");
    assert_eq!(ack.payload.as_bytes(), Some(b"0061".as_slice()));
}

#[test]
fn ack_for_an_unregistered_mid_is_still_rewritten() {
    let received = Message::new(7404);
    let mut ack = Message::ack_for(&received);
    registry().serialize(&mut ack).expect("ack serializes");

    assert_eq!(ack.mid, 5);
    assert_eq!(ack.payload.as_bytes(), Some(b"7404".as_slice()));
}

#[test]
fn subscriptions_are_rewritten_to_the_generic_subscribe_mid() {
    let mut subscribe = Message::subscribe(61);
    registry().serialize(&mut subscribe).expect("subscribe serializes");
    assert_eq!(subscribe.mid, 8);
    assert_eq!(subscribe.payload.as_bytes(), Some(b"0061".as_slice()));

    let mut unsubscribe = Message::unsubscribe(900);
    registry().serialize(&mut unsubscribe).expect("unsubscribe serializes");
    assert_eq!(unsubscribe.mid, 9);
    assert_eq!(unsubscribe.payload.as_bytes(), Some(b"0900".as_slice()));
}

#[test]
fn subscribing_to_a_non_publish_mid_is_rejected() {
    let mut message = Message::subscribe(MID_COMMAND_ERROR);
    let err = registry().serialize(&mut message).expect_err("MID 4 does not publish");
    assert_eq!(err, MidError::NotSubscribable { mid: 4 });
}

#[test]
fn link_ack_mids_have_no_codec_and_stay_raw() {
    assert!(registry().get(MID_POSITIVE_ACK).is_none());
    let mut message = Message::with_payload(MID_POSITIVE_ACK, Payload::Raw(Bytes::from_static(b"0001")));
    registry().parse(&mut message).expect("ack frames stay raw");
    assert_eq!(message.payload.as_bytes(), Some(b"0001".as_slice()));
}
