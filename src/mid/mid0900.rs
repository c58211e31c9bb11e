//! MID 0900, trace curve data.
//!
//! Publish type carrying a result header, a parameter Data Field group, the
//! trace time axis as Resolution Fields, and a NUL-separated block of
//! 16-bit big-endian samples. The sample scale comes from a Data Field
//! keyed PID 02213 (reciprocal) or 02214 (direct); sample timestamps
//! advance from the result timestamp by the first Resolution Field's time
//! value. Frames for this MID are not NUL-terminated on the wire.

use chrono::NaiveDateTime;

use super::{
    DataField,
    FieldReader,
    FieldWriter,
    MidCodec,
    MidError,
    MidPayload,
    ResolutionField,
    TraceSample,
    fields::scale_coefficient,
    payload_bytes,
};
use crate::message::{Message, Payload};

/// Decoded MID 0900 payload.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceCurve {
    /// Result the trace belongs to.
    pub result_data_id: u64,
    /// Instant the trace starts.
    pub timestamp: NaiveDateTime,
    /// Parameter Data Fields, including the sample scale coefficient.
    pub data_fields: Vec<DataField>,
    /// Set when the Data Field group ended early on a malformed record.
    pub out_of_spec: bool,
    /// Trace type code.
    pub trace_type: u8,
    /// Transducer type code.
    pub transducer_type: u8,
    /// Unit code of the sample values.
    pub unit: u16,
    /// Trace time axis.
    pub resolution_fields: Vec<ResolutionField>,
    /// Scaled, time-stamped samples.
    pub samples: Vec<TraceSample>,
}

pub(super) struct TraceCurveCodec;

impl MidCodec for TraceCurveCodec {
    fn mid(&self) -> u16 { 900 }

    fn supported_revisions(&self) -> &'static [u16] { &[1] }

    fn is_publish(&self) -> bool { true }

    fn parse(&self, message: &mut Message) -> Result<(), MidError> {
        let payload = payload_bytes(message)?;
        let mut reader = FieldReader::new(self.mid(), &payload);

        let result_data_id = reader.read_num("resultDataId", 10)?;
        let timestamp = reader.read_timestamp("timeStamp")?;
        let field_count = reader.read_num("numberOfParameterDataFields", 3)? as usize;
        let batch = reader.read_data_fields(field_count);
        let trace_type = reader.read_num("traceType", 2)? as u8;
        let transducer_type = reader.read_num("transducerType", 2)? as u8;
        let unit = reader.read_num("unit", 3)? as u16;
        let resolution_count = reader.read_num("numberOfResolutionFields", 3)? as usize;
        let resolution_fields = reader.read_resolution_fields(resolution_count)?;
        let sample_count = reader.read_num("numberOfTraceSamples", 5)? as usize;
        reader.expect_nul("traceSampleSeparator")?;

        let time_axis = resolution_fields
            .first()
            .ok_or(MidError::MalformedField {
                mid: self.mid(),
                field: "numberOfResolutionFields",
                found: "000".to_owned(),
            })?;
        let samples = reader.read_trace_samples(
            "traceSamples",
            sample_count,
            &batch.fields,
            timestamp,
            time_axis.time_value,
            time_axis.unit,
        )?;

        message.payload = Payload::Decoded(MidPayload::TraceCurve(Box::new(TraceCurve {
            result_data_id,
            timestamp,
            data_fields: batch.fields,
            out_of_spec: batch.out_of_spec,
            trace_type,
            transducer_type,
            unit,
            resolution_fields,
            samples,
        })));
        Ok(())
    }

    fn serialize(&self, message: &mut Message) -> Result<(), MidError> {
        let Payload::Decoded(decoded) = &message.payload else {
            return Ok(());
        };
        let MidPayload::TraceCurve(curve) = decoded else {
            return Err(MidError::UnexpectedPayload { mid: message.mid });
        };

        let coefficient = scale_coefficient(self.mid(), &curve.data_fields)?;
        let mut writer = FieldWriter::new();
        writer.write_num(curve.result_data_id, 10);
        writer.write_timestamp(&curve.timestamp);
        writer.write_num(curve.data_fields.len() as u64, 3);
        for field in &curve.data_fields {
            writer.write_data_field(field);
        }
        writer.write_num(u64::from(curve.trace_type), 2);
        writer.write_num(u64::from(curve.transducer_type), 2);
        writer.write_num(u64::from(curve.unit), 3);
        writer.write_num(curve.resolution_fields.len() as u64, 3);
        for field in &curve.resolution_fields {
            writer.write_resolution_field(field, &format!("{:.5}", field.time_value));
        }
        writer.write_num(curve.samples.len() as u64, 5);
        writer.write_nul();
        for sample in &curve.samples {
            let reading = (sample.value / coefficient).round() as i16;
            writer.write_bytes(&reading.to_be_bytes());
        }
        message.payload = Payload::Raw(writer.finish());
        Ok(())
    }
}
