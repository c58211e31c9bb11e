//! MID 0061, last tightening result data.
//!
//! Publish type: the client subscribes and the controller pushes one
//! message per tightening. Revision 1 numbers every parameter "01".."23";
//! torque values are framed in hundredths of a newton-metre.

use chrono::NaiveDateTime;

use super::{FieldReader, FieldWriter, MidCodec, MidError, MidPayload, payload_bytes};
use crate::message::{Message, Payload};

/// Decoded MID 0061 payload.
///
/// Status codes are framed verbatim: 0 = NOK, 1 = OK, 2 = not used for the
/// batch status.
#[derive(Clone, Debug, PartialEq)]
pub struct TighteningResult {
    /// Cell the result originates from.
    pub cell_id: u16,
    /// Channel the tightening ran on.
    pub channel_id: u8,
    /// Controller display name.
    pub controller_name: String,
    /// Vehicle identification number the result is bound to.
    pub vin_number: String,
    /// Job the tightening belongs to.
    pub job_id: u8,
    /// Parameter set used.
    pub parameter_set_id: u16,
    /// Batch size of the running batch.
    pub batch_size: u16,
    /// Position within the running batch.
    pub batch_counter: u16,
    /// Overall tightening status.
    pub tightening_status: u8,
    /// Torque window status.
    pub torque_status: u8,
    /// Angle window status.
    pub angle_status: u8,
    /// Lower torque limit, in Nm.
    pub torque_min: f64,
    /// Upper torque limit, in Nm.
    pub torque_max: f64,
    /// Torque target, in Nm.
    pub torque_target: f64,
    /// Achieved torque, in Nm.
    pub torque: f64,
    /// Lower angle limit, in degrees.
    pub angle_min: u32,
    /// Upper angle limit, in degrees.
    pub angle_max: u32,
    /// Angle target, in degrees.
    pub angle_target: u32,
    /// Achieved angle, in degrees.
    pub angle: u32,
    /// Instant the tightening completed.
    pub timestamp: NaiveDateTime,
    /// Last change of the parameter set.
    pub parameter_set_changed: NaiveDateTime,
    /// Batch status.
    pub batch_status: u8,
    /// Controller-unique tightening identifier.
    pub tightening_id: u64,
}

pub(super) struct TighteningResultCodec;

impl MidCodec for TighteningResultCodec {
    fn mid(&self) -> u16 { 61 }

    fn supported_revisions(&self) -> &'static [u16] { &[1] }

    fn is_publish(&self) -> bool { true }

    fn parse(&self, message: &mut Message) -> Result<(), MidError> {
        let payload = payload_bytes(message)?;
        let mut reader = FieldReader::new(self.mid(), &payload);

        reader.read_raw("cellIdParameter", "01")?;
        let cell_id = reader.read_num("cellId", 4)? as u16;
        reader.read_raw("channelIdParameter", "02")?;
        let channel_id = reader.read_num("channelId", 2)? as u8;
        reader.read_raw("controllerNameParameter", "03")?;
        let controller_name = reader.read_str("controllerName", 25)?;
        reader.read_raw("vinNumberParameter", "04")?;
        let vin_number = reader.read_str("vinNumber", 25)?;
        reader.read_raw("jobIdParameter", "05")?;
        let job_id = reader.read_num("jobId", 2)? as u8;
        reader.read_raw("parameterSetIdParameter", "06")?;
        let parameter_set_id = reader.read_num("parameterSetId", 3)? as u16;
        reader.read_raw("batchSizeParameter", "07")?;
        let batch_size = reader.read_num("batchSize", 4)? as u16;
        reader.read_raw("batchCounterParameter", "08")?;
        let batch_counter = reader.read_num("batchCounter", 4)? as u16;
        reader.read_raw("tighteningStatusParameter", "09")?;
        let tightening_status = reader.read_num("tighteningStatus", 1)? as u8;
        reader.read_raw("torqueStatusParameter", "10")?;
        let torque_status = reader.read_num("torqueStatus", 1)? as u8;
        reader.read_raw("angleStatusParameter", "11")?;
        let angle_status = reader.read_num("angleStatus", 1)? as u8;
        reader.read_raw("torqueMinParameter", "12")?;
        let torque_min = read_torque(&mut reader, "torqueMin")?;
        reader.read_raw("torqueMaxParameter", "13")?;
        let torque_max = read_torque(&mut reader, "torqueMax")?;
        reader.read_raw("torqueTargetParameter", "14")?;
        let torque_target = read_torque(&mut reader, "torqueTarget")?;
        reader.read_raw("torqueParameter", "15")?;
        let torque = read_torque(&mut reader, "torque")?;
        reader.read_raw("angleMinParameter", "16")?;
        let angle_min = reader.read_num("angleMin", 5)? as u32;
        reader.read_raw("angleMaxParameter", "17")?;
        let angle_max = reader.read_num("angleMax", 5)? as u32;
        reader.read_raw("angleTargetParameter", "18")?;
        let angle_target = reader.read_num("angleTarget", 5)? as u32;
        reader.read_raw("angleParameter", "19")?;
        let angle = reader.read_num("angle", 5)? as u32;
        reader.read_raw("timeStampParameter", "20")?;
        let timestamp = reader.read_timestamp("timeStamp")?;
        reader.read_raw("parameterSetChangedParameter", "21")?;
        let parameter_set_changed = reader.read_timestamp("parameterSetChanged")?;
        reader.read_raw("batchStatusParameter", "22")?;
        let batch_status = reader.read_num("batchStatus", 1)? as u8;
        reader.read_raw("tighteningIdParameter", "23")?;
        let tightening_id = reader.read_num("tighteningId", 10)?;

        message.payload = Payload::Decoded(MidPayload::TighteningResult(Box::new(
            TighteningResult {
                cell_id,
                channel_id,
                controller_name,
                vin_number,
                job_id,
                parameter_set_id,
                batch_size,
                batch_counter,
                tightening_status,
                torque_status,
                angle_status,
                torque_min,
                torque_max,
                torque_target,
                torque,
                angle_min,
                angle_max,
                angle_target,
                angle,
                timestamp,
                parameter_set_changed,
                batch_status,
                tightening_id,
            },
        )));
        Ok(())
    }

    fn serialize(&self, message: &mut Message) -> Result<(), MidError> {
        let Payload::Decoded(decoded) = &message.payload else {
            return Ok(());
        };
        let MidPayload::TighteningResult(result) = decoded else {
            return Err(MidError::UnexpectedPayload { mid: message.mid });
        };

        let mut writer = FieldWriter::new();
        writer.write_raw("01");
        writer.write_num(u64::from(result.cell_id), 4);
        writer.write_raw("02");
        writer.write_num(u64::from(result.channel_id), 2);
        writer.write_raw("03");
        writer.write_str(&result.controller_name, 25);
        writer.write_raw("04");
        writer.write_str(&result.vin_number, 25);
        writer.write_raw("05");
        writer.write_num(u64::from(result.job_id), 2);
        writer.write_raw("06");
        writer.write_num(u64::from(result.parameter_set_id), 3);
        writer.write_raw("07");
        writer.write_num(u64::from(result.batch_size), 4);
        writer.write_raw("08");
        writer.write_num(u64::from(result.batch_counter), 4);
        writer.write_raw("09");
        writer.write_num(u64::from(result.tightening_status), 1);
        writer.write_raw("10");
        writer.write_num(u64::from(result.torque_status), 1);
        writer.write_raw("11");
        writer.write_num(u64::from(result.angle_status), 1);
        writer.write_raw("12");
        write_torque(&mut writer, result.torque_min);
        writer.write_raw("13");
        write_torque(&mut writer, result.torque_max);
        writer.write_raw("14");
        write_torque(&mut writer, result.torque_target);
        writer.write_raw("15");
        write_torque(&mut writer, result.torque);
        writer.write_raw("16");
        writer.write_num(u64::from(result.angle_min), 5);
        writer.write_raw("17");
        writer.write_num(u64::from(result.angle_max), 5);
        writer.write_raw("18");
        writer.write_num(u64::from(result.angle_target), 5);
        writer.write_raw("19");
        writer.write_num(u64::from(result.angle), 5);
        writer.write_raw("20");
        writer.write_timestamp(&result.timestamp);
        writer.write_raw("21");
        writer.write_timestamp(&result.parameter_set_changed);
        writer.write_raw("22");
        writer.write_num(u64::from(result.batch_status), 1);
        writer.write_raw("23");
        writer.write_num(result.tightening_id, 10);
        message.payload = Payload::Raw(writer.finish());
        Ok(())
    }
}

/// Torque fields are six digits of hundredths of a newton-metre.
fn read_torque(reader: &mut FieldReader<'_>, field: &'static str) -> Result<f64, MidError> {
    Ok(reader.read_num(field, 6)? as f64 / 100.0)
}

fn write_torque(writer: &mut FieldWriter, value: f64) {
    writer.write_num((value * 100.0).round() as u64, 6);
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn sample_result() -> TighteningResult {
        TighteningResult {
            cell_id: 1,
            channel_id: 1,
            controller_name: "Airbag Station".to_owned(),
            vin_number: "ASDEAFGHKLBJGYTRES".to_owned(),
            job_id: 2,
            parameter_set_id: 14,
            batch_size: 12,
            batch_counter: 3,
            tightening_status: 1,
            torque_status: 1,
            angle_status: 0,
            torque_min: 10.0,
            torque_max: 14.75,
            torque_target: 12.5,
            torque: 12.52,
            angle_min: 200,
            angle_max: 400,
            angle_target: 300,
            angle: 322,
            timestamp: NaiveDate::from_ymd_opt(2024, 5, 17)
                .expect("valid date")
                .and_hms_opt(10, 30, 0)
                .expect("valid time"),
            parameter_set_changed: NaiveDate::from_ymd_opt(2024, 2, 1)
                .expect("valid date")
                .and_hms_opt(8, 0, 0)
                .expect("valid time"),
            batch_status: 1,
            tightening_id: 1234567890,
        }
    }

    #[test]
    fn parse_of_serialize_reproduces_the_result() {
        let original = sample_result();
        let mut message = Message::with_payload(
            61,
            Payload::Decoded(MidPayload::TighteningResult(Box::new(original.clone()))),
        );

        TighteningResultCodec.serialize(&mut message).expect("record serializes");
        assert!(matches!(message.payload, Payload::Raw(_)));

        TighteningResultCodec.parse(&mut message).expect("payload parses");
        assert_eq!(
            message.payload,
            Payload::Decoded(MidPayload::TighteningResult(Box::new(original)))
        );
    }

    #[test]
    fn truncated_result_reports_the_failing_field() {
        let mut message = Message::with_payload(
            61,
            Payload::Decoded(MidPayload::TighteningResult(Box::new(sample_result()))),
        );
        TighteningResultCodec.serialize(&mut message).expect("record serializes");

        let bytes = message.payload.to_bytes().expect("raw payload");
        let mut truncated =
            Message::with_payload(61, Payload::Raw(bytes.slice(..bytes.len() - 4)));
        let err = TighteningResultCodec
            .parse(&mut truncated)
            .expect_err("truncated payload");
        assert!(matches!(err, MidError::ShortBuffer { field: "tighteningId", .. }));
    }
}
