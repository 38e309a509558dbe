//! # J7-C Monitor Library
//!
//! Receive measurement values from a J7-C USB power monitor over Bluetooth LE.
//!
//! The meter streams each measurement as two notifications. This library
//! reassembles them into frames, decodes the fixed-point fields and renders
//! the samples as text, CSV, JSON or raw hex.

pub mod ble;
pub mod cli;
pub mod config;
pub mod error;
pub mod j7c;
pub mod output;
pub mod pipeline;
pub mod session;
