//! Outbound response queue
//!
//! Fixed-capacity ring of owned frame copies. Handlers push encoded
//! responses, the SPI link pops them one per transfer.

use heapless::{Deque, Vec};

use crate::error::Error;
use crate::wire::MAX_FRAME_LEN;

/// Default number of queued responses
pub const RESPONSE_QUEUE_DEPTH: usize = 16;

/// FIFO of encoded response frames
#[derive(Debug, Clone)]
pub struct ResponseQueue<const N: usize = RESPONSE_QUEUE_DEPTH> {
    frames: Deque<Vec<u8, MAX_FRAME_LEN>, N>,
}

impl<const N: usize> Default for ResponseQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ResponseQueue<N> {
    pub const fn new() -> Self {
        Self {
            frames: Deque::new(),
        }
    }

    /// Copy a frame onto the tail
    ///
    /// Fails with [`Error::InvalidArgument`] on an empty frame,
    /// [`Error::Range`] when the frame exceeds a slot, and
    /// [`Error::Allocation`] when every slot is taken.
    pub fn push(&mut self, frame: &[u8]) -> Result<(), Error> {
        if frame.is_empty() {
            return Err(Error::InvalidArgument);
        }
        let mut slot = Vec::new();
        slot.extend_from_slice(frame).map_err(|_| Error::Range)?;
        self.frames.push_back(slot).map_err(|_| Error::Allocation)
    }

    /// Copy the head frame into `out` and remove it
    ///
    /// Returns `Ok(0)` when the queue is empty. When `out` is too small the
    /// head frame stays queued and [`Error::Range`] is returned.
    pub fn pop(&mut self, out: &mut [u8]) -> Result<usize, Error> {
        let Some(head) = self.frames.front() else {
            return Ok(0);
        };
        let len = head.len();
        if out.len() < len {
            return Err(Error::Range);
        }
        out[..len].copy_from_slice(head);
        self.frames.pop_front();
        Ok(len)
    }

    /// Remove and return the head frame
    pub fn pop_frame(&mut self) -> Option<Vec<u8, MAX_FRAME_LEN>> {
        self.frames.pop_front()
    }

    /// Length of the head frame, if any
    pub fn peek_len(&self) -> Option<usize> {
        self.frames.front().map(|frame| frame.len())
    }

    pub fn count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.frames.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Drop every queued frame
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
