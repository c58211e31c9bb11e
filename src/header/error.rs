//! Error types for the framing layer.
//!
//! [`FrameError`] enumerates field-level violations of the wire format and
//! is shared by the parser and the serializer: the serializer rejects
//! out-of-range in-memory fields with the same variant the parser would
//! raise for the corresponding wire bytes. [`CodecError`] wraps framing and
//! I/O failures for use as the framed-transport error type.

use std::io;

use thiserror::Error;

/// Field-level framing errors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Length field is non-numeric or outside 20..=9999.
    #[error("invalid length field: {found:?}")]
    InvalidLength {
        /// Offending field text or value.
        found: String,
    },

    /// MID field is non-numeric or outside 1..=9999.
    #[error("invalid MID field: {found:?}")]
    InvalidMid {
        /// Offending field text or value.
        found: String,
    },

    /// Revision field is non-numeric or outside 1..=999.
    #[error("invalid revision field: {found:?}")]
    InvalidRevision {
        /// Offending field text or value.
        found: String,
    },

    /// No-ack flag is neither '0', '1' nor blank.
    #[error("invalid no-ack flag: {found:?}")]
    InvalidNoAck {
        /// Offending field text.
        found: String,
    },

    /// Station identifier is non-numeric or outside 0..=99.
    #[error("invalid station id: {found:?}")]
    InvalidStationId {
        /// Offending field text or value.
        found: String,
    },

    /// Spindle identifier is non-numeric or outside 0..=99.
    #[error("invalid spindle id: {found:?}")]
    InvalidSpindleId {
        /// Offending field text or value.
        found: String,
    },

    /// Sequence number is non-numeric or outside 0..=99.
    #[error("invalid sequence number: {found:?}")]
    InvalidSequenceNumber {
        /// Offending field text or value.
        found: String,
    },

    /// Message-parts digit is non-numeric or outside 0..=9.
    #[error("invalid message parts: {found:?}")]
    InvalidMessageParts {
        /// Offending field text or value.
        found: String,
    },

    /// Message-number digit is non-numeric or outside 0..=9.
    #[error("invalid message number: {found:?}")]
    InvalidMessageNumber {
        /// Offending field text or value.
        found: String,
    },

    /// The byte after the payload is not the NUL terminator.
    #[error("frame for MID {mid} is not NUL-terminated after {length} bytes")]
    InvalidTerminator {
        /// MID of the offending frame.
        mid: u16,
        /// Declared frame length.
        length: usize,
    },

    /// The payload has no byte representation; the MID serializer must run
    /// before the header serializer.
    #[error("payload for MID {mid} is not serialized to bytes")]
    InvalidPayload {
        /// MID of the offending message.
        mid: u16,
    },

    /// The payload exceeds what the protocol can carry.
    #[error("payload of {size} bytes exceeds the {max}-byte protocol maximum")]
    TooLarge {
        /// Offered payload size.
        size: usize,
        /// Protocol maximum.
        max: usize,
    },
}

/// Framed-transport error: a framing violation or an I/O failure.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Wire format violation.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Transport I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<CodecError> for io::Error {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(err) => err,
            CodecError::Frame(err) => io::Error::new(io::ErrorKind::InvalidData, err),
        }
    }
}
