//! Human readable text block, one per sample.

use crate::j7c::protocol::DecodedSample;

/// Render a sample as a labelled, fixed-width block
///
/// Groups are separated by blank lines: electrical, energy and runtime,
/// thermal, data lines.
pub fn format_sample(sample: &DecodedSample) -> Vec<String> {
    vec![
        format!("    Voltage: {:8.2}V", sample.voltage),
        format!("    Current: {:8.2}A", sample.current),
        format!("      Power: {:8.2}W", sample.power),
        format!(" Resistance: {:8.2}Ω", sample.resistance),
        String::new(),
        format!("   Capacity: {:5}   mAh", sample.capacity),
        format!("     Energy: {:8.2}Wh", sample.energy),
        format!("    Runtime: {}", sample.runtime),
        String::new(),
        format!("Temperature: {:5}   °C", sample.temperature),
        String::new(),
        format!("         D+: {:8.2}V", sample.data_plus),
        format!("         D-: {:8.2}V", sample.data_minus),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::sample;

    #[test]
    fn test_text_block_layout() {
        let lines = format_sample(&sample());

        assert_eq!(lines.len(), 13);
        assert_eq!(lines[0], "    Voltage:    12.34V");
        assert_eq!(lines[1], "    Current:     1.00A");
        assert_eq!(lines[2], "      Power:    12.34W");
        assert_eq!(lines[3], " Resistance:    12.34Ω");
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "   Capacity:   500   mAh");
        assert_eq!(lines[6], "     Energy:     3.21Wh");
        assert_eq!(lines[7], "    Runtime: 0001:02:03");
        assert_eq!(lines[8], "");
        assert_eq!(lines[9], "Temperature:    25   °C");
        assert_eq!(lines[10], "");
        assert_eq!(lines[11], "         D+:     0.50V");
        assert_eq!(lines[12], "         D-:     0.10V");
    }

    #[test]
    fn test_wide_values_are_not_truncated() {
        let mut wide = sample();
        wide.voltage = 123456.78;
        wide.capacity = 1_234_567;

        let lines = format_sample(&wide);
        assert_eq!(lines[0], "    Voltage: 123456.78V");
        assert_eq!(lines[5], "   Capacity: 1234567   mAh");
    }
}
