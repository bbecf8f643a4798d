//! Byte-stream frame router
//!
//! Accumulates request bytes until a tail byte closes a frame, then
//! dispatches the frame by its type byte. There is no length field on the
//! wire: the first [`REQUEST_TAIL`] at or after offset 3 ends the frame. A
//! payload byte equal to the tail value therefore cuts a frame short; the
//! truncated frame still reaches the handler and is rejected by the codec's
//! length check.

use crate::messages::MessageKind;
use crate::wire::{MAX_FRAME_LEN, REQUEST_HEADER, REQUEST_TAIL, TAIL_SCAN_START, TYPE_OFFSET};

/// Receives complete frames from the [`Router`]
pub trait FrameHandler {
    /// Handle one frame, header through tail inclusive
    fn handle(&mut self, kind: MessageKind, frame: &[u8]);
}

/// Frame accumulator and dispatcher
#[derive(Debug, Clone)]
pub struct Router {
    buffer: [u8; MAX_FRAME_LEN],
    index: usize,
    dispatched: u32,
    dropped: u32,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub const fn new() -> Self {
        Self {
            buffer: [0; MAX_FRAME_LEN],
            index: 0,
            dispatched: 0,
            dropped: 0,
        }
    }

    /// Discard any partially accumulated frame
    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Bytes accumulated toward the current frame
    pub fn pending(&self) -> usize {
        self.index
    }

    /// Frames handed to a handler
    pub fn dispatched(&self) -> u32 {
        self.dispatched
    }

    /// Complete frames dropped for an unknown type
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Feed one byte
    ///
    /// Returns `true` when this byte completed a frame that was dispatched.
    pub fn push<H: FrameHandler>(&mut self, byte: u8, handler: &mut H) -> bool {
        if self.index >= MAX_FRAME_LEN {
            self.index = 0;
        }
        self.buffer[self.index] = byte;
        self.index += 1;

        if self.buffer[0] != REQUEST_HEADER {
            self.index = 0;
            return false;
        }

        let last = self.index - 1;
        if last < TAIL_SCAN_START || byte != REQUEST_TAIL {
            return false;
        }

        let frame = &self.buffer[..self.index];
        let dispatched = match MessageKind::from_byte(frame[TYPE_OFFSET]) {
            Some(kind) => {
                handler.handle(kind, frame);
                self.dispatched = self.dispatched.wrapping_add(1);
                true
            }
            None => {
                self.dropped = self.dropped.wrapping_add(1);
                false
            }
        };
        self.index = 0;
        dispatched
    }

    /// Feed a byte slice
    ///
    /// Returns the number of frames dispatched.
    pub fn feed<H: FrameHandler>(&mut self, bytes: &[u8], handler: &mut H) -> usize {
        bytes
            .iter()
            .filter(|&&byte| self.push(byte, handler))
            .count()
    }
}
