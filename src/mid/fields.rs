//! Fixed-width ASCII field readers and writers for MID payloads.
//!
//! [`FieldReader`] walks a payload with an advancing cursor; every read
//! names the field so failures carry useful context. Group readers follow
//! the protocol's asymmetry: Data Field groups are read tolerantly because
//! real controllers emit under-specified records, while Resolution Field
//! groups are strict and fail the parse on any malformation.

use chrono::{Duration, NaiveDateTime};

use super::{
    MidError,
    records::{
        DataField,
        DataFieldBatch,
        PID_TRACE_SCALE_DIRECT,
        PID_TRACE_SCALE_RECIPROCAL,
        ResolutionField,
        TraceSample,
        parameter_name,
        time_unit_multiplier_ms,
        unit_name,
    },
};

/// Wire format for Open Protocol wall-clock timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d:%H:%M:%S";
/// Width of a wall-clock timestamp field.
pub const TIMESTAMP_LEN: usize = 19;

/// Cursor over a MID payload.
#[derive(Debug)]
pub struct FieldReader<'a> {
    mid: u16,
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    /// Create a reader over `buf` for error reporting against `mid`.
    #[must_use]
    pub fn new(mid: u16, buf: &'a [u8]) -> Self { Self { mid, buf, pos: 0 } }

    /// Current cursor position.
    #[must_use]
    pub fn position(&self) -> usize { self.pos }

    /// Bytes left after the cursor.
    #[must_use]
    pub fn remaining(&self) -> usize { self.buf.len() - self.pos }

    fn take(&mut self, field: &'static str, width: usize) -> Result<&'a [u8], MidError> {
        if self.remaining() < width {
            return Err(MidError::ShortBuffer {
                mid: self.mid,
                field,
                needed: width,
                available: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + width];
        self.pos += width;
        Ok(slice)
    }

    /// Read a right-trimmed string field of `width` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MidError::ShortBuffer`] when the payload runs out.
    pub fn read_str(&mut self, field: &'static str, width: usize) -> Result<String, MidError> {
        let slice = self.take(field, width)?;
        Ok(String::from_utf8_lossy(slice).trim_end().to_owned())
    }

    /// Read a field that must hold exactly `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`MidError::MalformedField`] when the bytes differ and
    /// [`MidError::ShortBuffer`] when the payload runs out.
    pub fn read_raw(&mut self, field: &'static str, expected: &str) -> Result<(), MidError> {
        let slice = self.take(field, expected.len())?;
        if slice != expected.as_bytes() {
            return Err(self.malformed(field, slice));
        }
        Ok(())
    }

    /// Read an all-digit numeric field of `width` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MidError::MalformedField`] on any non-digit byte and
    /// [`MidError::ShortBuffer`] when the payload runs out.
    pub fn read_num(&mut self, field: &'static str, width: usize) -> Result<u64, MidError> {
        let slice = self.take(field, width)?;
        slice
            .iter()
            .try_fold(0_u64, |value, &byte| {
                byte.is_ascii_digit()
                    .then(|| value * 10 + u64::from(byte - b'0'))
            })
            .ok_or_else(|| self.malformed(field, slice))
    }

    /// Read a decimal field of `width` bytes, tolerating space padding.
    ///
    /// # Errors
    ///
    /// Returns [`MidError::MalformedField`] when the text is not a number
    /// and [`MidError::ShortBuffer`] when the payload runs out.
    pub fn read_decimal(&mut self, field: &'static str, width: usize) -> Result<f64, MidError> {
        let slice = self.take(field, width)?;
        String::from_utf8_lossy(slice)
            .trim()
            .parse()
            .map_err(|_| self.malformed(field, slice))
    }

    /// Read a 19-byte wall-clock timestamp field.
    ///
    /// # Errors
    ///
    /// Returns [`MidError::MalformedField`] when the text is not a
    /// timestamp and [`MidError::ShortBuffer`] when the payload runs out.
    pub fn read_timestamp(&mut self, field: &'static str) -> Result<NaiveDateTime, MidError> {
        let slice = self.take(field, TIMESTAMP_LEN)?;
        let text = String::from_utf8_lossy(slice);
        NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT)
            .map_err(|_| self.malformed(field, slice))
    }

    /// Assert the next byte is NUL and advance past it.
    ///
    /// # Errors
    ///
    /// Returns [`MidError::MalformedField`] for any other byte and
    /// [`MidError::ShortBuffer`] when the payload runs out.
    pub fn expect_nul(&mut self, field: &'static str) -> Result<(), MidError> {
        let slice = self.take(field, 1)?;
        if slice[0] != 0 {
            return Err(self.malformed(field, slice));
        }
        Ok(())
    }

    /// Read up to `count` Data Field records, tolerantly.
    ///
    /// Reading stops at the first malformed or truncated record; the cursor
    /// is left at the start of the offending record and the batch is
    /// flagged out of spec.
    pub fn read_data_fields(&mut self, count: usize) -> DataFieldBatch {
        let mut batch = DataFieldBatch::default();
        for _ in 0..count {
            let mark = self.pos;
            match self.read_one_data_field() {
                Ok(field) => batch.fields.push(field),
                Err(_) => {
                    self.pos = mark;
                    batch.out_of_spec = true;
                    break;
                }
            }
        }
        batch
    }

    fn read_one_data_field(&mut self) -> Result<DataField, MidError> {
        let parameter_id = self.read_str("parameterId", 5)?;
        if parameter_id.len() != 5 || !parameter_id.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(MidError::MalformedField {
                mid: self.mid,
                field: "parameterId",
                found: parameter_id,
            });
        }
        let length = self.read_num("dataFieldLength", 3)? as usize;
        let data_type = self.read_num("dataType", 2)? as u16;
        let unit = self.read_num("unit", 3)? as u16;
        let step_number = self.read_num("stepNumber", 4)? as u16;
        let value = self.take("dataValue", length)?;
        Ok(DataField {
            parameter_name: parameter_name(&parameter_id),
            parameter_id,
            data_type,
            unit_name: unit_name(unit),
            unit,
            step_number,
            data_value: String::from_utf8_lossy(value).into_owned(),
        })
    }

    /// Read exactly `count` Resolution Field records, strictly.
    ///
    /// # Errors
    ///
    /// Any malformed or truncated record fails the whole group.
    pub fn read_resolution_fields(
        &mut self,
        count: usize,
    ) -> Result<Vec<ResolutionField>, MidError> {
        let mut fields = Vec::with_capacity(count);
        for _ in 0..count {
            let first_index = self.read_num("firstIndex", 5)? as u32;
            let last_index = self.read_num("lastIndex", 5)? as u32;
            let length = self.read_num("resolutionFieldLength", 3)? as usize;
            let data_type = self.read_num("dataType", 2)? as u16;
            let unit = self.read_num("unit", 3)? as u16;
            let time_value = self.read_decimal("timeValue", length)?;
            fields.push(ResolutionField {
                first_index,
                last_index,
                data_type,
                unit_name: unit_name(unit),
                unit,
                time_value,
            });
        }
        Ok(fields)
    }

    /// Read `count` 16-bit big-endian trace samples, scaling each with the
    /// coefficient found among `coefficients` and stamping it relative to
    /// `base` using `time_value` in the unit declared by `unit`.
    ///
    /// # Errors
    ///
    /// Returns [`MidError::MissingScaleCoefficient`] when no coefficient
    /// Data Field is present, [`MidError::MalformedField`] when the
    /// coefficient is not usable, and [`MidError::ShortBuffer`] when the
    /// sample block is truncated.
    pub fn read_trace_samples(
        &mut self,
        field: &'static str,
        count: usize,
        coefficients: &[DataField],
        base: NaiveDateTime,
        time_value: f64,
        unit: u16,
    ) -> Result<Vec<TraceSample>, MidError> {
        let coefficient = scale_coefficient(self.mid, coefficients)?;
        let step_ms = time_value * time_unit_multiplier_ms(unit);
        let mut samples = Vec::with_capacity(count);
        for index in 0..count {
            let raw = self.take(field, 2)?;
            let reading = i16::from_be_bytes([raw[0], raw[1]]);
            let offset_us = (step_ms * index as f64 * 1_000.0).round() as i64;
            samples.push(TraceSample {
                value: f64::from(reading) * coefficient,
                timestamp: base + Duration::microseconds(offset_us),
            });
        }
        Ok(samples)
    }

    fn malformed(&self, field: &'static str, slice: &[u8]) -> MidError {
        MidError::MalformedField {
            mid: self.mid,
            field,
            found: String::from_utf8_lossy(slice).into_owned(),
        }
    }
}

/// Extract the trace scale multiplier from a sibling Data Field group.
///
/// PID 02213 carries a reciprocal coefficient, PID 02214 a direct one.
///
/// # Errors
///
/// Returns [`MidError::MissingScaleCoefficient`] when neither PID is
/// present and [`MidError::MalformedField`] when the coefficient value is
/// non-numeric or zero where a reciprocal is required.
pub(super) fn scale_coefficient(mid: u16, coefficients: &[DataField]) -> Result<f64, MidError> {
    for field in coefficients {
        let (reciprocal, name) = match field.parameter_id.as_str() {
            PID_TRACE_SCALE_RECIPROCAL => (true, "traceScaleReciprocal"),
            PID_TRACE_SCALE_DIRECT => (false, "traceScaleDirect"),
            _ => continue,
        };
        let value = field.numeric_value().ok_or_else(|| MidError::MalformedField {
            mid,
            field: name,
            found: field.data_value.clone(),
        })?;
        if reciprocal {
            if value == 0.0 {
                return Err(MidError::MalformedField {
                    mid,
                    field: name,
                    found: field.data_value.clone(),
                });
            }
            return Ok(value.recip());
        }
        return Ok(value);
    }
    Err(MidError::MissingScaleCoefficient { mid })
}

/// Builder for fixed-width ASCII payloads.
///
/// Numeric fields are written zero-padded, strings space-padded on the
/// right. Widths are the caller's contract; values that do not fit are a
/// codec bug.
#[derive(Debug, Default)]
pub struct FieldWriter {
    buf: Vec<u8>,
}

impl FieldWriter {
    /// Create an empty writer.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Write a zero-padded numeric field.
    pub fn write_num(&mut self, value: u64, width: usize) {
        let digits = format!("{value:0width$}");
        debug_assert!(digits.len() == width, "value {value} does not fit in {width} digits");
        self.buf.extend_from_slice(digits.as_bytes());
    }

    /// Write a right-space-padded string field, truncating over-long text.
    pub fn write_str(&mut self, value: &str, width: usize) {
        let text = if value.len() > width { &value[..width] } else { value };
        self.buf.extend_from_slice(text.as_bytes());
        self.buf.resize(self.buf.len() + (width - text.len()), b' ');
    }

    /// Write bytes verbatim.
    pub fn write_raw(&mut self, value: &str) { self.buf.extend_from_slice(value.as_bytes()); }

    /// Write raw bytes verbatim.
    pub fn write_bytes(&mut self, value: &[u8]) { self.buf.extend_from_slice(value); }

    /// Write a single NUL separator byte.
    pub fn write_nul(&mut self) { self.buf.push(0); }

    /// Write a 19-byte wall-clock timestamp field.
    pub fn write_timestamp(&mut self, value: &NaiveDateTime) {
        self.write_raw(&value.format(TIMESTAMP_FORMAT).to_string());
    }

    /// Write one Data Field record.
    pub fn write_data_field(&mut self, field: &DataField) {
        debug_assert!(field.parameter_id.len() == 5, "PIDs are five digits");
        self.write_raw(&field.parameter_id);
        self.write_num(field.data_value.len() as u64, 3);
        self.write_num(u64::from(field.data_type), 2);
        self.write_num(u64::from(field.unit), 3);
        self.write_num(u64::from(field.step_number), 4);
        self.write_raw(&field.data_value);
    }

    /// Write one Resolution Field record with the given textual time value.
    pub fn write_resolution_field(&mut self, field: &ResolutionField, time_value: &str) {
        self.write_num(u64::from(field.first_index), 5);
        self.write_num(u64::from(field.last_index), 5);
        self.write_num(time_value.len() as u64, 3);
        self.write_num(u64::from(field.data_type), 2);
        self.write_num(u64::from(field.unit), 3);
        self.write_raw(time_value);
    }

    /// Finish the payload, returning its bytes.
    #[must_use]
    pub fn finish(self) -> bytes::Bytes { bytes::Bytes::from(self.buf) }
}

#[cfg(test)]
#[path = "fields_tests.rs"]
mod tests;
