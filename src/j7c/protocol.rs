//! # J7-C Protocol Constants and Types
//!
//! Core definitions for the J7-C (UC96) BLE telemetry stream.
//!
//! The meter pushes one measurement frame as two consecutive notifications:
//! a 23-byte head followed by a 19-byte tail. Together they form a 42-byte
//! frame whose fields sit at fixed offsets, all unsigned big-endian.

use std::fmt;
use std::ops::Range;

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};

use crate::error::{MeterError, Result};

/// Advertised name of compatible meters
pub const J7C_DEVICE_NAME: &str = "UC96_BLE";

/// Length of the first notification of a frame
pub const HEAD_FRAGMENT_LEN: usize = 23;

/// Length of the second notification of a frame
pub const TAIL_FRAGMENT_LEN: usize = 19;

/// Complete frame length (head + tail)
pub const FRAME_LEN: usize = HEAD_FRAGMENT_LEN + TAIL_FRAGMENT_LEN;

/// Voltage, 3 bytes, centivolts
pub const VOLTAGE: Range<usize> = 0x07..0x0a;

/// Current, 3 bytes, centiamps
pub const CURRENT: Range<usize> = 0x0a..0x0d;

/// Accumulated capacity, 3 bytes, mAh
pub const CAPACITY: Range<usize> = 0x0d..0x10;

/// Accumulated energy, 4 bytes, centiwatt-hours
pub const ENERGY: Range<usize> = 0x10..0x14;

/// D- line voltage, 2 bytes, centivolts
pub const DATA_MINUS: Range<usize> = 0x14..0x16;

/// D+ line voltage, 2 bytes, centivolts
pub const DATA_PLUS: Range<usize> = 0x19..0x1b;

/// Temperature, 1 byte, °C
pub const TEMPERATURE: usize = 0x1c;

/// Runtime hours, 2 bytes
pub const RUNTIME_HOURS: Range<usize> = 0x1d..0x1f;

/// Runtime minutes, 1 byte
pub const RUNTIME_MINUTES: usize = 0x1f;

/// Runtime seconds, 1 byte
pub const RUNTIME_SECONDS: usize = 0x20;

/// Divisor for the ×100 fixed-point fields
pub const FIXED_POINT_SCALE: f64 = 100.0;

/// One reassembled 42-byte telemetry frame
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    /// Join a head and a tail fragment
    ///
    /// Callers must pass exactly `HEAD_FRAGMENT_LEN` and `TAIL_FRAGMENT_LEN`
    /// bytes; the assembler is the only producer.
    pub(crate) fn from_parts(head: &[u8; HEAD_FRAGMENT_LEN], tail: &[u8]) -> Self {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[..HEAD_FRAGMENT_LEN].copy_from_slice(head);
        bytes[HEAD_FRAGMENT_LEN..].copy_from_slice(tail);
        Self(bytes)
    }

    /// Raw frame bytes
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }
}

impl From<[u8; FRAME_LEN]> for Frame {
    fn from(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Frame {
    type Error = MeterError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; FRAME_LEN] = bytes.try_into().map_err(|_| {
            MeterError::Protocol(format!(
                "Frame must be {} bytes, got {}",
                FRAME_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({:02X?})", &self.0[..])
    }
}

/// Time the meter has been measuring since its counters were reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Runtime {
    pub hours: u16,
    pub minutes: u8,
    pub seconds: u8,
}

impl fmt::Display for Runtime {
    /// Zero-padded `HHHH:MM:SS`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One decoded measurement
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSample {
    /// Capture instant (local time)
    pub timestamp: DateTime<Local>,

    /// Bus voltage in volts
    pub voltage: f64,

    /// Current in amperes
    pub current: f64,

    /// Power in watts (voltage × current)
    pub power: f64,

    /// Load resistance in ohms, 0 when voltage or current is 0
    pub resistance: f64,

    /// Accumulated capacity in mAh
    pub capacity: u32,

    /// Accumulated energy in watt-hours
    pub energy: f64,

    pub runtime: Runtime,

    /// Meter temperature in °C
    pub temperature: u8,

    /// D+ line voltage in volts
    pub data_plus: f64,

    /// D- line voltage in volts
    pub data_minus: f64,

    /// Frame the sample was decoded from
    pub frame: Frame,
}

impl DecodedSample {
    /// Timestamp in ISO 8601 local time with microseconds
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}
