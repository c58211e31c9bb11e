//! MID codec registry and per-MID payload codecs.
//!
//! Each leaf codec owns one MID across its supported revisions and converts
//! between raw payload bytes and a structured record. The [`Registry`] is
//! built once at startup from the registration list in [`registry`] and is
//! read-only afterwards; MIDs without a codec pass through as raw bytes.

mod error;
mod fields;
mod mid0001;
mod mid0002;
mod mid0003;
mod mid0004;
mod mid0005;
mod mid0061;
mod mid0071;
mod mid0900;
mod records;
mod registry;

pub use error::MidError;
pub use fields::{FieldReader, FieldWriter, TIMESTAMP_FORMAT, TIMESTAMP_LEN};
pub use mid0002::CommunicationStartAck;
pub use mid0004::CommandError;
pub use mid0005::CommandAccepted;
pub use mid0061::TighteningResult;
pub use mid0071::Alarm;
pub use mid0900::TraceCurve;
pub use records::{
    DataField,
    DataFieldBatch,
    PID_TRACE_SCALE_DIRECT,
    PID_TRACE_SCALE_RECIPROCAL,
    ResolutionField,
    TraceSample,
    parameter_name,
    time_unit_multiplier_ms,
    unit_name,
};
pub use registry::{Registry, registry};

use crate::message::Message;

/// Codec for one MID across one or more revisions.
///
/// `parse` replaces a raw payload with its structured record; `serialize`
/// lowers a structured record to the raw bytes the header serializer
/// frames. Byte payloads offered to `serialize` pass through untouched so
/// callers can send pre-encoded messages.
pub trait MidCodec: Send + Sync {
    /// MID this codec handles.
    fn mid(&self) -> u16;

    /// Revisions this codec understands.
    fn supported_revisions(&self) -> &'static [u16];

    /// Whether the MID is a publish type accepting subscription requests.
    fn is_publish(&self) -> bool { false }

    /// Decode the raw payload of `message` into its structured record.
    ///
    /// # Errors
    ///
    /// Returns a [`MidError`] when the payload is short or malformed.
    fn parse(&self, message: &mut Message) -> Result<(), MidError>;

    /// Encode the structured payload of `message` into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`MidError`] when the payload shape does not fit the MID.
    fn serialize(&self, message: &mut Message) -> Result<(), MidError>;
}

/// Structured payload records produced and consumed by registered codecs.
#[derive(Clone, Debug, PartialEq)]
pub enum MidPayload {
    /// Subscription request; rewritten to MID 8 on serialize.
    Subscribe,
    /// Unsubscription request; rewritten to MID 9 on serialize.
    Unsubscribe,
    /// MID 0001, application communication start.
    CommunicationStart,
    /// MID 0002, communication start acknowledge.
    CommunicationStartAck(CommunicationStartAck),
    /// MID 0003, application communication stop.
    CommunicationStop,
    /// MID 0004, command error.
    CommandError(CommandError),
    /// MID 0005, command accepted.
    CommandAccepted(CommandAccepted),
    /// MID 0061, tightening result.
    TighteningResult(Box<TighteningResult>),
    /// MID 0071, alarm.
    Alarm(Alarm),
    /// MID 0900, trace curve data.
    TraceCurve(Box<TraceCurve>),
}

/// Copy a byte payload out of `message` for a codec to read.
fn payload_bytes(message: &Message) -> Result<bytes::Bytes, MidError> {
    message
        .payload
        .to_bytes()
        .ok_or(MidError::UnexpectedPayload { mid: message.mid })
}
