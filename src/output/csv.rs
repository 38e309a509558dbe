//! Delimited records, one line per sample.

use crate::j7c::protocol::DecodedSample;

/// Column titles, in record order
pub const CSV_COLUMNS: [&str; 11] = [
    "Measurement Time",
    "Voltage (V)",
    "Current (A)",
    "Power (W)",
    "Resistance (Ω)",
    "Capacity (mAh)",
    "Energy (Wh)",
    "Runtime (HHHH:MM:SS)",
    "Temperature (°C)",
    "D+ (V)",
    "D- (V)",
];

/// Header line naming every column
pub fn header_line(delimiter: &str) -> String {
    CSV_COLUMNS.join(delimiter)
}

/// One record: timestamp, voltage, current, power, resistance, capacity,
/// energy, runtime, temperature, D+, D-
pub fn format_record(sample: &DecodedSample, delimiter: &str) -> String {
    let fields = [
        sample.timestamp_iso(),
        format!("{:.2}", sample.voltage),
        format!("{:.2}", sample.current),
        format!("{:.2}", sample.power),
        format!("{:.2}", sample.resistance),
        sample.capacity.to_string(),
        format!("{:.2}", sample.energy),
        sample.runtime.to_string(),
        sample.temperature.to_string(),
        format!("{:.2}", sample.data_plus),
        format!("{:.2}", sample.data_minus),
    ];
    fields.join(delimiter)
}
