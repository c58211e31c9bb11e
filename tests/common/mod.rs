//! Shared helpers for link-layer integration tests.
//!
//! The peer side of each test plays the controller: it reads the frames
//! the client writes and injects replies built by hand, so the tests pin
//! the wire bytes rather than trusting the crate's own serializer.

// Each test binary compiles this module separately and uses a subset.
#![allow(dead_code)]

use tokio::io::{AsyncReadExt, DuplexStream};

/// Build a framed message the way a controller would emit it: revision
/// 001, station/spindle 00, NUL-terminated.
pub fn build_frame(mid: u16, sequence: u8, parts: u8, number: u8, payload: &[u8]) -> Vec<u8> {
    let length = 20 + payload.len();
    let mut frame =
        format!("{length:04}{mid:04}00100000{sequence:02}{parts}{number}").into_bytes();
    frame.extend_from_slice(payload);
    frame.push(0);
    frame
}

/// Read one NUL-terminated frame off the peer side of the transport.
pub async fn read_frame(peer: &mut DuplexStream) -> Vec<u8> {
    let mut length_field = [0_u8; 4];
    peer.read_exact(&mut length_field)
        .await
        .expect("frame length field");
    let length: usize = std::str::from_utf8(&length_field)
        .expect("ASCII length field")
        .parse()
        .expect("numeric length field");

    let mut rest = vec![0_u8; length - 4 + 1];
    peer.read_exact(&mut rest).await.expect("frame body");

    let mut frame = length_field.to_vec();
    frame.append(&mut rest);
    frame
}
