//! MID 0004, command error.
//!
//! The controller's rejection of a preceding command, naming the rejected
//! MID and a two-digit error code.

use super::{FieldReader, FieldWriter, MidCodec, MidError, MidPayload, payload_bytes};
use crate::message::{Message, Payload};

/// Decoded MID 0004 payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandError {
    /// MID of the rejected command.
    pub mid_number: u16,
    /// Controller error code.
    pub error_code: u8,
}

pub(super) struct CommandErrorCodec;

impl MidCodec for CommandErrorCodec {
    fn mid(&self) -> u16 { 4 }

    fn supported_revisions(&self) -> &'static [u16] { &[1] }

    fn parse(&self, message: &mut Message) -> Result<(), MidError> {
        let payload = payload_bytes(message)?;
        let mut reader = FieldReader::new(self.mid(), &payload);

        let mid_number = reader.read_num("midNumber", 4)? as u16;
        let error_code = reader.read_num("errorCode", 2)? as u8;

        message.payload = Payload::Decoded(MidPayload::CommandError(CommandError {
            mid_number,
            error_code,
        }));
        Ok(())
    }

    fn serialize(&self, message: &mut Message) -> Result<(), MidError> {
        let Payload::Decoded(decoded) = &message.payload else {
            return Ok(());
        };
        let MidPayload::CommandError(error) = decoded else {
            return Err(MidError::UnexpectedPayload { mid: message.mid });
        };

        let mut writer = FieldWriter::new();
        writer.write_num(u64::from(error.mid_number), 4);
        writer.write_num(u64::from(error.error_code), 2);
        message.payload = Payload::Raw(writer.finish());
        Ok(())
    }
}
