//! # J7-C Frame Decoder
//!
//! Extracts measurement fields from a reassembled 42-byte frame.

use chrono::{DateTime, Local};

use super::protocol::*;

/// Read an unsigned big-endian integer of up to 4 bytes
fn be_uint(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

/// Read a ×100 fixed-point field
fn fixed_point(bytes: &[u8]) -> f64 {
    f64::from(be_uint(bytes)) / FIXED_POINT_SCALE
}

/// Decode a frame, stamping it with the current local time
///
/// # Examples
///
/// ```
/// use j7c_monitor::j7c::decoder::decode_frame;
/// use j7c_monitor::j7c::protocol::Frame;
///
/// let mut bytes = [0u8; 42];
/// bytes[0x07..0x0a].copy_from_slice(&[0x00, 0x27, 0x10]); // 10000 cV
/// let sample = decode_frame(&Frame::from(bytes));
/// assert_eq!(sample.voltage, 100.0);
/// ```
pub fn decode_frame(frame: &Frame) -> DecodedSample {
    decode_frame_at(frame, Local::now())
}

/// Decode a frame captured at `timestamp`
///
/// Never fails: every 42-byte frame maps to a sample. Resistance is clamped
/// to 0 unless both voltage and current are strictly positive.
pub fn decode_frame_at(frame: &Frame, timestamp: DateTime<Local>) -> DecodedSample {
    let bytes = frame.as_bytes();

    let voltage = fixed_point(&bytes[VOLTAGE]);
    let current = fixed_point(&bytes[CURRENT]);
    let power = voltage * current;
    let resistance = if voltage > 0.0 && current > 0.0 {
        voltage / current
    } else {
        0.0
    };

    let runtime = Runtime {
        hours: be_uint(&bytes[RUNTIME_HOURS]) as u16,
        minutes: bytes[RUNTIME_MINUTES],
        seconds: bytes[RUNTIME_SECONDS],
    };

    DecodedSample {
        timestamp,
        voltage,
        current,
        power,
        resistance,
        capacity: be_uint(&bytes[CAPACITY]),
        energy: fixed_point(&bytes[ENERGY]),
        runtime,
        temperature: bytes[TEMPERATURE],
        data_plus: fixed_point(&bytes[DATA_PLUS]),
        data_minus: fixed_point(&bytes[DATA_MINUS]),
        frame: *frame,
    }
}
