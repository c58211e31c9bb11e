//! MID 0002, communication start acknowledge.
//!
//! The controller's reply to MID 0001, identifying the cell and channel the
//! client is connected to. Fields are numbered parameters: "01" cell ID,
//! "02" channel ID, "03" controller name.

use super::{FieldReader, FieldWriter, MidCodec, MidError, MidPayload, payload_bytes};
use crate::message::{Message, Payload};

/// Decoded MID 0002 payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommunicationStartAck {
    /// Cell the controller belongs to.
    pub cell_id: u16,
    /// Channel the connection is served on.
    pub channel_id: u8,
    /// Controller display name.
    pub controller_name: String,
}

pub(super) struct CommunicationStartAckCodec;

impl MidCodec for CommunicationStartAckCodec {
    fn mid(&self) -> u16 { 2 }

    fn supported_revisions(&self) -> &'static [u16] { &[1] }

    fn parse(&self, message: &mut Message) -> Result<(), MidError> {
        let payload = payload_bytes(message)?;
        let mut reader = FieldReader::new(self.mid(), &payload);

        reader.read_raw("cellIdParameter", "01")?;
        let cell_id = reader.read_num("cellId", 4)? as u16;
        reader.read_raw("channelIdParameter", "02")?;
        let channel_id = reader.read_num("channelId", 2)? as u8;
        reader.read_raw("controllerNameParameter", "03")?;
        let controller_name = reader.read_str("controllerName", 25)?;

        message.payload = Payload::Decoded(MidPayload::CommunicationStartAck(
            CommunicationStartAck {
                cell_id,
                channel_id,
                controller_name,
            },
        ));
        Ok(())
    }

    fn serialize(&self, message: &mut Message) -> Result<(), MidError> {
        let Payload::Decoded(decoded) = &message.payload else {
            return Ok(());
        };
        let MidPayload::CommunicationStartAck(ack) = decoded else {
            return Err(MidError::UnexpectedPayload { mid: message.mid });
        };

        let mut writer = FieldWriter::new();
        writer.write_raw("01");
        writer.write_num(u64::from(ack.cell_id), 4);
        writer.write_raw("02");
        writer.write_num(u64::from(ack.channel_id), 2);
        writer.write_raw("03");
        writer.write_str(&ack.controller_name, 25);
        message.payload = Payload::Raw(writer.finish());
        Ok(())
    }
}
