//! MID 0005, command accepted.
//!
//! Sent by both sides: the controller accepts a client command, and the
//! client acknowledges subscribed data (the `is_ack` rewrite in the
//! registry produces this MID).

use super::{FieldReader, FieldWriter, MidCodec, MidError, MidPayload, payload_bytes};
use crate::message::{Message, Payload};

/// Decoded MID 0005 payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandAccepted {
    /// MID of the accepted command.
    pub mid_number: u16,
}

pub(super) struct CommandAcceptedCodec;

impl MidCodec for CommandAcceptedCodec {
    fn mid(&self) -> u16 { 5 }

    fn supported_revisions(&self) -> &'static [u16] { &[1] }

    fn parse(&self, message: &mut Message) -> Result<(), MidError> {
        let payload = payload_bytes(message)?;
        let mut reader = FieldReader::new(self.mid(), &payload);
        let mid_number = reader.read_num("midNumber", 4)? as u16;

        message.payload =
            Payload::Decoded(MidPayload::CommandAccepted(CommandAccepted { mid_number }));
        Ok(())
    }

    fn serialize(&self, message: &mut Message) -> Result<(), MidError> {
        let Payload::Decoded(decoded) = &message.payload else {
            return Ok(());
        };
        let MidPayload::CommandAccepted(accepted) = decoded else {
            return Err(MidError::UnexpectedPayload { mid: message.mid });
        };

        let mut writer = FieldWriter::new();
        writer.write_num(u64::from(accepted.mid_number), 4);
        message.payload = Payload::Raw(writer.finish());
        Ok(())
    }
}
