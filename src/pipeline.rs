//! # Measurement Pipeline
//!
//! Turns notification payloads into written output:
//! fragments → `FrameAssembler` → `decode_frame` → `OutputFormatter` → `OutputSink`.
//!
//! All mutable state lives here and is only touched from `on_fragment`, which
//! the session calls serially in arrival order.

use async_trait::async_trait;
use tracing::debug;

use crate::ble::transport::FragmentHandler;
use crate::error::Result;
use crate::j7c::assembler::FrameAssembler;
use crate::j7c::decoder::decode_frame;
use crate::output::sink::OutputSink;
use crate::output::OutputFormatter;

pub struct Pipeline {
    assembler: FrameAssembler,
    formatter: OutputFormatter,
    sink: Box<dyn OutputSink>,
    header_written: bool,
    frames: u64,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("formatter", &self.formatter)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(formatter: OutputFormatter, sink: Box<dyn OutputSink>) -> Self {
        Self {
            assembler: FrameAssembler::new(),
            formatter,
            sink,
            header_written: false,
            frames: 0,
        }
    }

    /// Write the formatter's preamble, once per pipeline
    pub async fn write_header(&mut self) -> Result<()> {
        if self.header_written {
            return Ok(());
        }
        if let Some(lines) = self.formatter.header() {
            self.sink.write_lines(&lines).await?;
        }
        self.header_written = true;
        Ok(())
    }

    /// Drop any half-received frame (used when the link is re-established)
    pub fn reset(&mut self) {
        self.assembler.reset();
    }

    /// Frames decoded and written so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Fragments the assembler discarded so far
    pub fn dropped_fragments(&self) -> u64 {
        self.assembler.dropped()
    }
}

#[async_trait]
impl FragmentHandler for Pipeline {
    async fn on_fragment(&mut self, fragment: &[u8]) -> Result<()> {
        let Some(frame) = self.assembler.accept(fragment) else {
            return Ok(());
        };

        let sample = decode_frame(&frame);
        let lines = self.formatter.format(&sample)?;
        self.sink.write_lines(&lines).await?;
        self.frames += 1;

        if self.frames == 1 {
            debug!("First measurement received");
        }
        Ok(())
    }
}
