//! Error types for the MID codec layer.

use thiserror::Error;

/// Failures raised while parsing or serializing a MID payload.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MidError {
    /// The message revision is outside the codec's supported set.
    #[error("MID {mid:04} revision {revision} is not supported")]
    UnsupportedRevision {
        /// MID of the offending message.
        mid: u16,
        /// Revision the message declared.
        revision: u16,
    },

    /// The payload ended before a field could be read in full.
    #[error("payload for MID {mid:04} needs {needed} bytes for field {field}, has {available}")]
    ShortBuffer {
        /// MID of the offending message.
        mid: u16,
        /// Field being read when the payload ran out.
        field: &'static str,
        /// Bytes the field requires.
        needed: usize,
        /// Bytes remaining in the payload.
        available: usize,
    },

    /// A field held bytes that do not match its declared type.
    #[error("malformed field {field} for MID {mid:04}: {found:?}")]
    MalformedField {
        /// MID of the offending message.
        mid: u16,
        /// Field that failed to parse.
        field: &'static str,
        /// Offending field text.
        found: String,
    },

    /// Trace samples require a scale coefficient in a sibling Data Field.
    #[error("no trace scale coefficient (PID 02213 or 02214) among the data fields of MID {mid:04}")]
    MissingScaleCoefficient {
        /// MID of the offending message.
        mid: u16,
    },

    /// A structured payload was offered for a MID with no registered codec.
    #[error("MID {mid:04} has no registered codec for a structured payload")]
    UnknownMid {
        /// MID of the offending message.
        mid: u16,
    },

    /// A subscription was requested for a MID that does not publish events.
    #[error("MID {mid:04} does not publish events")]
    NotSubscribable {
        /// MID of the offending message.
        mid: u16,
    },

    /// The payload variant does not fit the codec's contract.
    #[error("unexpected payload shape for MID {mid:04}")]
    UnexpectedPayload {
        /// MID of the offending message.
        mid: u16,
    },
}
