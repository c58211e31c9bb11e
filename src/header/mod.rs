//! Framing codec for the Open Protocol wire format.
//!
//! Frames are ASCII: a 20-byte header (length, MID, revision, flags,
//! addressing, sequencing) followed by the payload and a single NUL
//! terminator. The decoder slices frames out of an arbitrary-boundary byte
//! stream; the encoder is a pure function from [`Message`](crate::message::Message)
//! to framed bytes.

mod error;
mod parser;
mod serializer;

pub use error::{CodecError, FrameError};
pub use serializer::encode_frame;

/// Fixed header size in bytes.
pub const HEADER_LEN: usize = 20;
/// Largest value the 4-digit length field can carry.
pub const MAX_FRAME_LEN: usize = 9999;
/// Largest payload a single frame can carry.
pub const MAX_PART_PAYLOAD: usize = MAX_FRAME_LEN - HEADER_LEN;
/// Largest part count of a multi-part message.
pub const MAX_MESSAGE_PARTS: usize = 9;
/// Largest payload a multi-part message can carry (89 811 bytes).
pub const MAX_PAYLOAD_LEN: usize = MAX_PART_PAYLOAD * MAX_MESSAGE_PARTS;

/// Framing codec implementing [`tokio_util::codec::Decoder`] and
/// [`tokio_util::codec::Encoder`] for [`Message`](crate::message::Message).
///
/// The decoder keeps partial frames in the `BytesMut` carry buffer supplied
/// by the framed transport; no partial message is ever emitted.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderCodec {
    raw_data: bool,
}

impl HeaderCodec {
    /// Create a codec that discards original frame bytes after decoding.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Create a codec that attaches the original framed bytes to each
    /// decoded message when `raw_data` is set.
    #[must_use]
    pub const fn with_raw_data(raw_data: bool) -> Self { Self { raw_data } }

    /// Report whether decoded messages carry their original frame bytes.
    #[must_use]
    pub const fn raw_data(&self) -> bool { self.raw_data }
}
