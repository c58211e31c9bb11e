//! Repeating record groups carried by Open Protocol payloads.
//!
//! Data Fields identify a parameter by PID, Resolution Fields describe the
//! time axis of a trace, and Trace Samples are scaled 16-bit readings. The
//! named-code tables resolve PIDs and unit codes to display names; both are
//! deployment tables covering the parameters this client works with, not
//! the full Open Protocol catalogue.

use chrono::NaiveDateTime;

/// PID whose Data Field carries a reciprocal trace scale coefficient.
pub const PID_TRACE_SCALE_RECIPROCAL: &str = "02213";
/// PID whose Data Field carries a direct trace scale coefficient.
pub const PID_TRACE_SCALE_DIRECT: &str = "02214";

/// One parameter Data Field record.
#[derive(Clone, Debug, PartialEq)]
pub struct DataField {
    /// Five-digit parameter identifier.
    pub parameter_id: String,
    /// Display name resolved from the PID table, when known.
    pub parameter_name: Option<&'static str>,
    /// Declared data type code.
    pub data_type: u16,
    /// Declared unit code.
    pub unit: u16,
    /// Display name resolved from the unit table, when known.
    pub unit_name: Option<&'static str>,
    /// Step the parameter belongs to; 0 when not step-bound.
    pub step_number: u16,
    /// Field value, exactly as framed.
    pub data_value: String,
}

impl DataField {
    /// Parse the value as a number, if it is one.
    #[must_use]
    pub fn numeric_value(&self) -> Option<f64> { self.data_value.trim().parse().ok() }
}

/// Result of a tolerant Data Field group read.
///
/// Controllers in the field emit under-specified records; when one cannot
/// be parsed the reader stops and reports what it has instead of failing
/// the whole message, flagging the device as out of spec.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataFieldBatch {
    /// Records parsed before the group ended or broke.
    pub fields: Vec<DataField>,
    /// Set when the group ended early on a malformed record.
    pub out_of_spec: bool,
}

/// One Resolution Field record describing a slice of the trace time axis.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolutionField {
    /// First sample index the record covers.
    pub first_index: u32,
    /// Last sample index the record covers.
    pub last_index: u32,
    /// Declared data type code.
    pub data_type: u16,
    /// Time unit code; see [`time_unit_multiplier_ms`].
    pub unit: u16,
    /// Display name resolved from the unit table, when known.
    pub unit_name: Option<&'static str>,
    /// Time step between samples, in the declared unit.
    pub time_value: f64,
}

/// One scaled and time-stamped trace sample.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceSample {
    /// Sample reading after scale correction.
    pub value: f64,
    /// Instant the sample was taken.
    pub timestamp: NaiveDateTime,
}

/// Resolve a parameter identifier to its display name.
#[must_use]
pub fn parameter_name(parameter_id: &str) -> Option<&'static str> {
    Some(match parameter_id {
        "00020" => "Batch size",
        "00021" => "Batch counter",
        "01002" => "Torque final target",
        "01003" => "Torque min limit",
        "01004" => "Torque max limit",
        "01287" => "Final torque",
        "01288" => "Final angle",
        "02101" => "Angle min limit",
        "02102" => "Angle max limit",
        "02103" => "Final angle target",
        "02104" => "Rundown angle",
        "02201" => "Trace time stamp",
        "02202" => "Trace torque values",
        "02203" => "Trace angle values",
        "02213" => "Trace scale coefficient (reciprocal)",
        "02214" => "Trace scale coefficient (direct)",
        _ => return None,
    })
}

/// Resolve a unit code to its display name.
#[must_use]
pub fn unit_name(unit: u16) -> Option<&'static str> {
    Some(match unit {
        1 => "Nm",
        2 => "Lbf.ft",
        3 => "Lbf.in",
        4 => "kpm",
        11 => "%",
        12 => "deg",
        13 => "mm",
        14 => "in",
        200 => "s",
        201 => "min",
        202 => "ms",
        203 => "h",
        _ => return None,
    })
}

/// Milliseconds per unit of trace time for the given unit code.
///
/// Unit codes 200..=203 double as time-unit multipliers for trace sample
/// timestamps; any other code leaves the time value uninterpreted.
#[must_use]
pub fn time_unit_multiplier_ms(unit: u16) -> f64 {
    match unit {
        200 => 1_000.0,
        201 => 60_000.0,
        202 => 1.0,
        203 => 3_600_000.0,
        _ => 1.0,
    }
}
