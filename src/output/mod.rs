//! # Output Module
//!
//! Renders decoded samples and writes them to a sink.
//!
//! This module handles:
//! - Text, CSV, JSON and raw hex encodings
//! - Per-encoding stream preambles (CSV header, JSON list open, raw ruler)
//! - Rejecting encodings that are not implemented
//! - File, stdout and network sinks

pub mod csv;
pub mod json;
pub mod raw;
pub mod sink;
pub mod text;

use crate::config::{CsvOptions, JsonOptions, OutputConfig, OutputMode, RawOptions};
use crate::error::{MeterError, Result};
use crate::j7c::protocol::DecodedSample;

/// Sample renderer for one selected encoding
#[derive(Debug, Clone, PartialEq)]
pub enum OutputFormatter {
    Text,
    Csv(CsvOptions),
    Json(JsonOptions),
    Raw(RawOptions),
}

impl OutputFormatter {
    /// Build the formatter for the configured mode
    ///
    /// # Errors
    ///
    /// Returns `NotImplemented` for modes without an encoder (InfluxDB)
    pub fn new(config: &OutputConfig) -> Result<Self> {
        match config.mode {
            OutputMode::Text => Ok(Self::Text),
            OutputMode::Csv => Ok(Self::Csv(config.csv.clone())),
            OutputMode::Json => Ok(Self::Json(config.json.clone())),
            OutputMode::Raw => Ok(Self::Raw(config.raw.clone())),
            OutputMode::InfluxDb => Err(MeterError::NotImplemented("InfluxDB output".to_string())),
        }
    }

    /// Lines written once, before the first sample
    pub fn header(&self) -> Option<Vec<String>> {
        match self {
            Self::Text => None,
            Self::Csv(options) if options.header => Some(vec![csv::header_line(&options.delimiter)]),
            Self::Csv(_) => None,
            Self::Json(_) => Some(vec![json::LIST_OPEN.to_string()]),
            Self::Raw(options) if options.header => Some(vec![raw::header_line(options)]),
            Self::Raw(_) => None,
        }
    }

    /// Render one sample
    pub fn format(&self, sample: &DecodedSample) -> Result<Vec<String>> {
        match self {
            Self::Text => Ok(text::format_sample(sample)),
            Self::Csv(options) => Ok(vec![csv::format_record(sample, &options.delimiter)]),
            Self::Json(options) => json::format_record(sample, options),
            Self::Raw(options) => Ok(vec![raw::format_frame(&sample.frame, options)]),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::j7c::protocol::{Frame, Runtime, FRAME_LEN};
    use chrono::{Local, TimeZone};

    /// Sample with easily recognisable values
    pub(crate) fn sample() -> DecodedSample {
        DecodedSample {
            timestamp: Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            voltage: 12.34,
            current: 1.0,
            power: 12.34,
            resistance: 12.34,
            capacity: 500,
            energy: 3.21,
            runtime: Runtime { hours: 1, minutes: 2, seconds: 3 },
            temperature: 25,
            data_plus: 0.5,
            data_minus: 0.1,
            frame: Frame::from([0u8; FRAME_LEN]),
        }
    }

    fn config(mode: OutputMode) -> OutputConfig {
        OutputConfig {
            mode,
            ..OutputConfig::default()
        }
    }

    #[test]
    fn test_influxdb_rejected_at_construction() {
        let result = OutputFormatter::new(&config(OutputMode::InfluxDb));
        assert!(matches!(result, Err(MeterError::NotImplemented(_))));
    }

    #[test]
    fn test_text_has_no_header() {
        let formatter = OutputFormatter::new(&config(OutputMode::Text)).unwrap();
        assert_eq!(formatter.header(), None);
        assert_eq!(formatter.format(&sample()).unwrap().len(), 13);
    }

    #[test]
    fn test_csv_header_suppressed() {
        let mut cfg = config(OutputMode::Csv);
        assert!(OutputFormatter::new(&cfg).unwrap().header().is_some());

        cfg.csv.header = false;
        assert_eq!(OutputFormatter::new(&cfg).unwrap().header(), None);
    }

    #[test]
    fn test_json_header_opens_list() {
        let formatter = OutputFormatter::new(&config(OutputMode::Json)).unwrap();
        assert_eq!(formatter.header(), Some(vec!["[".to_string()]));
    }

    #[test]
    fn test_raw_header_optional() {
        let mut cfg = config(OutputMode::Raw);
        assert_eq!(OutputFormatter::new(&cfg).unwrap().header(), None);

        cfg.raw.header = true;
        let header = OutputFormatter::new(&cfg).unwrap().header().unwrap();
        assert_eq!(header.len(), 1);
        assert!(header[0].starts_with("000102"));
    }

    #[test]
    fn test_raw_formats_frame_bytes() {
        let formatter = OutputFormatter::new(&config(OutputMode::Raw)).unwrap();
        let lines = formatter.format(&sample()).unwrap();
        assert_eq!(lines, vec!["00".repeat(FRAME_LEN)]);
    }
}
