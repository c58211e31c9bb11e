//! Error types for the link layer.

use std::{fmt, io};

use thiserror::Error;

use crate::{header::FrameError, mid::MidError};

/// Reason a link-layer acknowledgement failed the pending write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AckProblem {
    /// The peer replied with MID 9998.
    Negative {
        /// MID the peer rejected.
        mid: u16,
    },
    /// The acknowledged MID does not match the pending write.
    MidMismatch {
        /// MID of the pending write.
        expected: u16,
        /// MID the peer acknowledged.
        actual: u16,
    },
    /// The acknowledgement sequence number does not follow the pending
    /// write's sequence number.
    SequenceMismatch {
        /// Sequence number the acknowledgement should carry.
        expected: u8,
        /// Sequence number it carried.
        actual: u8,
    },
    /// The acknowledgement payload does not name a MID.
    Unreadable,
}

impl fmt::Display for AckProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative { mid } => write!(f, "peer rejected MID {mid:04}"),
            Self::MidMismatch { expected, actual } => {
                write!(f, "acked MID {actual:04}, expected {expected:04}")
            }
            Self::SequenceMismatch { expected, actual } => {
                write!(f, "ack sequence {actual}, expected {expected}")
            }
            Self::Unreadable => write!(f, "unreadable ack payload"),
        }
    }
}

/// Failures surfaced by the link layer.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Wire format violation from the framing layer.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// MID codec failure.
    #[error("MID codec error: {0}")]
    Mid(#[from] MidError),

    /// Transport I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No acknowledgement arrived within the retry budget.
    #[error("no acknowledgement for MID {mid:04} after {retries} retries")]
    Timeout {
        /// MID of the unacknowledged write.
        mid: u16,
        /// Retries spent before giving up.
        retries: u32,
    },

    /// The peer's acknowledgement did not match the pending write.
    #[error("acknowledgement mismatch: {0}")]
    AckMismatch(AckProblem),

    /// The peer's sequence number broke the expected progression.
    #[error("peer sequence violation: expected {expected}, got {actual}")]
    InvalidSequenceNumber {
        /// Sequence number the peer should have used.
        expected: u8,
        /// Sequence number it used.
        actual: u8,
    },

    /// A multi-part frame arrived out of order.
    #[error("inconsistent message number: expected part {expected}, got {actual}")]
    InconsistencyMessageNumber {
        /// Part number expected next.
        expected: u8,
        /// Part number received.
        actual: u8,
    },

    /// The link layer has been destroyed or its driver has exited.
    #[error("link layer closed")]
    Closed,
}

impl From<crate::header::CodecError> for LinkError {
    fn from(err: crate::header::CodecError) -> Self {
        match err {
            crate::header::CodecError::Frame(err) => Self::Frame(err),
            crate::header::CodecError::Io(err) => Self::Io(err),
        }
    }
}
