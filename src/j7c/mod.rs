//! # J7-C Protocol Module
//!
//! Implementation of the J7-C (UC96) USB power meter BLE telemetry stream.
//!
//! This module handles:
//! - Reassembling 23 + 19 byte notifications into 42-byte frames
//! - Decoding fixed-point measurement fields from a frame
//! - Wire layout constants and sample types

pub mod protocol;
pub mod assembler;
pub mod decoder;
