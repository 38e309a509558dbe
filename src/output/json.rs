//! JSON records framed as elements of one list.
//!
//! The list is opened once at stream start and every record is followed by a
//! `,` line. The closing bracket is never written, so a captured stream only
//! parses after the consumer strips the last separator and appends `]`.
//! Kept as-is for compatibility with existing captures, which is also why
//! D+ and D- are keyed `data1` and `data2`.

use serde::Serialize;

use crate::config::JsonOptions;
use crate::error::Result;
use crate::j7c::protocol::{DecodedSample, Runtime};

/// Stream preamble
pub const LIST_OPEN: &str = "[";

/// Line written after every record
pub const RECORD_SEPARATOR: &str = ",";

#[derive(Debug, Serialize)]
struct JsonRecord<'a> {
    timestamp: String,
    voltage: f64,
    current: f64,
    power: f64,
    resistance: f64,
    capacity: u32,
    energy: f64,
    runtime: &'a Runtime,
    temperature: u8,
    #[serde(rename = "data1")]
    data_plus: f64,
    #[serde(rename = "data2")]
    data_minus: f64,
}

/// Round to the two decimals the meter resolves
fn hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl<'a> From<&'a DecodedSample> for JsonRecord<'a> {
    fn from(sample: &'a DecodedSample) -> Self {
        Self {
            timestamp: sample.timestamp_iso(),
            voltage: sample.voltage,
            current: sample.current,
            power: hundredths(sample.power),
            resistance: hundredths(sample.resistance),
            capacity: sample.capacity,
            energy: sample.energy,
            runtime: &sample.runtime,
            temperature: sample.temperature,
            data_plus: sample.data_plus,
            data_minus: sample.data_minus,
        }
    }
}

/// Render one sample as a JSON object followed by the separator line
///
/// Pretty output uses a four space indent.
pub fn format_record(sample: &DecodedSample, options: &JsonOptions) -> Result<Vec<String>> {
    let record = JsonRecord::from(sample);

    let json = if options.pretty {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        record.serialize(&mut serializer)?;
        String::from_utf8_lossy(&buf).into_owned()
    } else {
        serde_json::to_string(&record)?
    };

    Ok(vec![json, RECORD_SEPARATOR.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::sample;
    use serde_json::Value;

    #[test]
    fn test_compact_record() {
        let sample = sample();
        let lines = format_record(&sample, &JsonOptions { pretty: false }).unwrap();

        assert_eq!(lines.len(), 2);
        assert!(!lines[0].contains('\n'));
        assert_eq!(lines[1], ",");

        let value: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["timestamp"], sample.timestamp_iso());
        assert_eq!(value["voltage"], 12.34);
        assert_eq!(value["current"], 1.0);
        assert_eq!(value["power"], 12.34);
        assert_eq!(value["resistance"], 12.34);
        assert_eq!(value["capacity"], 500);
        assert_eq!(value["energy"], 3.21);
        assert_eq!(value["runtime"], "0001:02:03");
        assert_eq!(value["temperature"], 25);
        assert_eq!(value["data1"], 0.5);
        assert_eq!(value["data2"], 0.1);
        assert!(value.get("data_plus").is_none());
        assert!(value.get("data_minus").is_none());
    }

    #[test]
    fn test_pretty_record_uses_four_space_indent() {
        let lines = format_record(&sample(), &JsonOptions { pretty: true }).unwrap();

        assert!(lines[0].starts_with("{\n    \"timestamp\": "));
        assert!(lines[0].ends_with("\n}"));
        assert!(serde_json::from_str::<Value>(&lines[0]).is_ok());
    }

    #[test]
    fn test_derived_fields_are_rounded() {
        let mut sample = sample();
        sample.power = 5.12 * 1.37;
        sample.resistance = 5.12 / 1.37;

        let lines = format_record(&sample, &JsonOptions::default()).unwrap();
        let value: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["power"], 7.01);
        assert_eq!(value["resistance"], 3.74);
    }

    #[test]
    fn test_json_stream_is_left_open() {
        let options = JsonOptions::default();
        let mut stream = vec![LIST_OPEN.to_string()];
        stream.extend(format_record(&sample(), &options).unwrap());
        stream.extend(format_record(&sample(), &options).unwrap());
        let text = stream.join("\n");

        // No closing bracket: the stream as written is not a valid document
        assert!(serde_json::from_str::<Value>(&text).is_err());

        // Dropping the trailing separator and closing the list makes it one
        let closed = format!("{}]", text.trim_end_matches(','));
        let value: Value = serde_json::from_str(&closed).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
    }
}
