//! Hex dump of the reassembled frame.

use crate::config::RawOptions;
use crate::j7c::protocol::{Frame, FRAME_LEN};

/// Lowercase hex, bytes optionally separated by single spaces
fn hex_line<I: IntoIterator<Item = u8>>(bytes: I, pretty: bool) -> String {
    let separator = if pretty { " " } else { "" };
    bytes
        .into_iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Offset ruler `00 01 .. 29` aligned with `format_frame` output
pub fn header_line(options: &RawOptions) -> String {
    hex_line(0..FRAME_LEN as u8, options.pretty)
}

pub fn format_frame(frame: &Frame, options: &RawOptions) -> String {
    hex_line(frame.as_bytes().iter().copied(), options.pretty)
}
