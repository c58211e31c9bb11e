//! MID 0071, alarm.
//!
//! Publish type: the controller pushes one message per alarm state change.
//! Revision 2 appends a parameter Data Field group to the fixed fields;
//! the group is read tolerantly like every Data Field group.

use chrono::NaiveDateTime;

use super::{
    DataField,
    FieldReader,
    FieldWriter,
    MidCodec,
    MidError,
    MidPayload,
    payload_bytes,
};
use crate::message::{Message, Payload};

/// Decoded MID 0071 payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Alarm {
    /// Four-character alarm code, e.g. "E851".
    pub alarm_code: String,
    /// Whether the controller is ready (1) or not (0).
    pub controller_ready: u8,
    /// Whether the tool is ready (1) or not (0).
    pub tool_ready: u8,
    /// Instant the alarm fired.
    pub timestamp: NaiveDateTime,
    /// Parameter Data Fields, revision 2 and later.
    pub data_fields: Vec<DataField>,
    /// Set when the Data Field group ended early on a malformed record.
    pub out_of_spec: bool,
}

pub(super) struct AlarmCodec;

impl MidCodec for AlarmCodec {
    fn mid(&self) -> u16 { 71 }

    fn supported_revisions(&self) -> &'static [u16] { &[1, 2] }

    fn is_publish(&self) -> bool { true }

    fn parse(&self, message: &mut Message) -> Result<(), MidError> {
        let payload = payload_bytes(message)?;
        let mut reader = FieldReader::new(self.mid(), &payload);

        let alarm_code = reader.read_str("alarmCode", 4)?;
        let controller_ready = reader.read_num("controllerReady", 1)? as u8;
        let tool_ready = reader.read_num("toolReady", 1)? as u8;
        let timestamp = reader.read_timestamp("timeStamp")?;

        let (data_fields, out_of_spec) = if message.revision >= 2 {
            let count = reader.read_num("numberOfDataFields", 3)? as usize;
            let batch = reader.read_data_fields(count);
            (batch.fields, batch.out_of_spec)
        } else {
            (Vec::new(), false)
        };

        message.payload = Payload::Decoded(MidPayload::Alarm(Alarm {
            alarm_code,
            controller_ready,
            tool_ready,
            timestamp,
            data_fields,
            out_of_spec,
        }));
        Ok(())
    }

    fn serialize(&self, message: &mut Message) -> Result<(), MidError> {
        let Payload::Decoded(decoded) = &message.payload else {
            return Ok(());
        };
        let MidPayload::Alarm(alarm) = decoded else {
            return Err(MidError::UnexpectedPayload { mid: message.mid });
        };

        let mut writer = FieldWriter::new();
        writer.write_str(&alarm.alarm_code, 4);
        writer.write_num(u64::from(alarm.controller_ready), 1);
        writer.write_num(u64::from(alarm.tool_ready), 1);
        writer.write_timestamp(&alarm.timestamp);
        if message.revision >= 2 {
            writer.write_num(alarm.data_fields.len() as u64, 3);
            for field in &alarm.data_fields {
                writer.write_data_field(field);
            }
        }
        message.payload = Payload::Raw(writer.finish());
        Ok(())
    }
}
