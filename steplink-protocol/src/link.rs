//! SPI slave transport state
//!
//! Owned by the transfer-complete interrupt: classifies each received
//! buffer, queues request bytes for the poll loop and primes the next
//! transmit buffer from the response queue.

use heapless::{Deque, Vec};

use crate::fifo::ResponseQueue;
use crate::handshake::{prime, status_for_occupancy, PrimeOutcome};
use crate::wire::{MASTER_POLL, MAX_FRAME_LEN, REQUEST_HEADER, REQUEST_TAIL, TAIL_SCAN_START};

/// Default depth of the receive queue
pub const RX_QUEUE_DEPTH: usize = 4;

/// Why a received buffer was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Overflow {
    /// Receive queue was full
    QueueFull,
    /// Header without a tail inside the transfer window
    InvalidFrame,
}

/// Classification of one received transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Capture {
    /// Master polled for a response without sending a request
    Poll,
    /// No request header in the buffer
    Noise,
    /// Request bytes queued for the poll loop
    Frame,
    /// Request bytes dropped
    Overflow(Overflow),
}

/// Transfer counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    pub frames: u32,
    pub polls: u32,
    pub queue_full: u32,
    pub invalid_frames: u32,
    pub responses_sent: u32,
    /// Responses too large for the transmit buffer
    pub responses_dropped: u32,
}

/// SPI slave link with an `RX`-deep receive queue
#[derive(Debug)]
pub struct SpiLink<const RX: usize = RX_QUEUE_DEPTH> {
    rx: Deque<Vec<u8, MAX_FRAME_LEN>, RX>,
    pending: Option<Vec<u8, MAX_FRAME_LEN>>,
    stats: LinkStats,
}

impl<const RX: usize> Default for SpiLink<RX> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const RX: usize> SpiLink<RX> {
    pub const fn new() -> Self {
        Self {
            rx: Deque::new(),
            pending: None,
            stats: LinkStats {
                frames: 0,
                polls: 0,
                queue_full: 0,
                invalid_frames: 0,
                responses_sent: 0,
                responses_dropped: 0,
            },
        }
    }

    /// Classify a received buffer and queue any request bytes
    ///
    /// Bytes from the first header through the last tail are kept, so a
    /// transfer carrying several frames reaches the router intact.
    pub fn capture(&mut self, rx: &[u8]) -> Capture {
        if rx.first() == Some(&MASTER_POLL) {
            self.stats.polls = self.stats.polls.wrapping_add(1);
            return Capture::Poll;
        }

        let Some(start) = rx.iter().position(|&b| b == REQUEST_HEADER) else {
            return Capture::Noise;
        };

        let window = &rx[start..];
        let end = window
            .iter()
            .rposition(|&b| b == REQUEST_TAIL)
            .filter(|&end| end >= TAIL_SCAN_START);
        let Some(end) = end else {
            self.stats.invalid_frames = self.stats.invalid_frames.wrapping_add(1);
            return Capture::Overflow(Overflow::InvalidFrame);
        };

        let mut frame = Vec::new();
        if frame.extend_from_slice(&window[..=end]).is_err() {
            self.stats.invalid_frames = self.stats.invalid_frames.wrapping_add(1);
            return Capture::Overflow(Overflow::InvalidFrame);
        }
        if self.rx.push_back(frame).is_err() {
            self.stats.queue_full = self.stats.queue_full.wrapping_add(1);
            return Capture::Overflow(Overflow::QueueFull);
        }
        self.stats.frames = self.stats.frames.wrapping_add(1);
        Capture::Frame
    }

    /// Prime `tx` for the next transfer
    ///
    /// Takes the next response from `responses` when none is pending. The
    /// status byte reflects receive queue occupancy.
    pub fn prepare<const N: usize>(
        &mut self,
        tx: &mut [u8],
        responses: &mut ResponseQueue<N>,
    ) -> PrimeOutcome {
        if self.pending.is_none() {
            self.pending = responses.pop_frame();
        }

        let status = status_for_occupancy(self.rx.len(), RX);
        let outcome = prime(status, self.pending.as_deref(), tx);

        if outcome.consumed() {
            self.pending = None;
            self.stats.responses_sent = self.stats.responses_sent.wrapping_add(1);
        } else if self.pending.take().is_some() {
            // A recognized status leaves a response out only when it cannot fit
            self.stats.responses_dropped = self.stats.responses_dropped.wrapping_add(1);
        }
        outcome
    }

    /// Transfer-complete entry point: capture `rx` then prime `tx`
    pub fn on_transfer_complete<const N: usize>(
        &mut self,
        rx: &[u8],
        tx: &mut [u8],
        responses: &mut ResponseQueue<N>,
    ) -> Capture {
        let capture = self.capture(rx);
        self.prepare(tx, responses);
        capture
    }

    /// Hand the oldest captured request bytes to the poll loop
    pub fn take_frame(&mut self) -> Option<Vec<u8, MAX_FRAME_LEN>> {
        self.rx.pop_front()
    }

    /// Captured transfers waiting for the poll loop
    pub fn rx_count(&self) -> usize {
        self.rx.len()
    }

    pub fn has_pending_response(&self) -> bool {
        self.pending.is_some()
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }
}
