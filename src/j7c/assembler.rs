//! # J7-C Frame Assembler
//!
//! Rebuilds 42-byte frames from the two notifications the meter sends per
//! measurement. There is no sequence number or checksum on the link, so frame
//! boundaries are inferred purely from fragment length:
//! - `Idle`: waiting for a 23-byte head
//! - `AwaitingTail`: head buffered, waiting for the 19-byte tail
//!
//! Anything that does not fit this cadence is dropped. A partial frame is
//! never emitted.

use tracing::trace;

use super::protocol::{Frame, HEAD_FRAGMENT_LEN, TAIL_FRAGMENT_LEN};

/// Assembler state
#[derive(Debug, Clone)]
enum State {
    /// No fragment buffered
    Idle,
    /// Head fragment buffered, waiting for the tail
    AwaitingTail { head: [u8; HEAD_FRAGMENT_LEN] },
}

/// Two-state frame assembler
#[derive(Debug)]
pub struct FrameAssembler {
    state: State,
    /// Fragments thrown away since creation
    dropped: u64,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    /// Create an idle assembler
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            dropped: 0,
        }
    }

    /// Feed one notification payload
    ///
    /// # Returns
    ///
    /// * `Some(Frame)` when `fragment` completes a frame
    /// * `None` otherwise (fragment buffered or dropped)
    ///
    /// # Examples
    ///
    /// ```
    /// use j7c_monitor::j7c::assembler::FrameAssembler;
    ///
    /// let mut assembler = FrameAssembler::new();
    /// assert!(assembler.accept(&[0u8; 23]).is_none());
    /// let frame = assembler.accept(&[0u8; 19]).unwrap();
    /// assert_eq!(frame.as_bytes().len(), 42);
    /// ```
    pub fn accept(&mut self, fragment: &[u8]) -> Option<Frame> {
        match fragment.len() {
            HEAD_FRAGMENT_LEN => {
                if let State::AwaitingTail { .. } = self.state {
                    // Previous head never got its tail
                    self.note_dropped("stale head replaced");
                }
                let mut head = [0u8; HEAD_FRAGMENT_LEN];
                head.copy_from_slice(fragment);
                self.state = State::AwaitingTail { head };
                None
            }
            TAIL_FRAGMENT_LEN => match std::mem::replace(&mut self.state, State::Idle) {
                State::AwaitingTail { head } => Some(Frame::from_parts(&head, fragment)),
                State::Idle => {
                    self.note_dropped("tail without head");
                    None
                }
            },
            len => {
                trace!("Ignoring notification of unexpected length {}", len);
                self.dropped += 1;
                None
            }
        }
    }

    /// Forget any buffered head
    pub fn reset(&mut self) {
        self.state = State::Idle;
    }

    /// True while a head fragment is buffered
    pub fn is_awaiting_tail(&self) -> bool {
        matches!(self.state, State::AwaitingTail { .. })
    }

    /// Number of fragments discarded so far
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn note_dropped(&mut self, reason: &str) {
        trace!("Dropping fragment: {}", reason);
        self.dropped += 1;
    }
}
