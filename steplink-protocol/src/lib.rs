//! Steplink SPI Protocol
//!
//! This crate defines the framed request/response protocol spoken between
//! the host (SPI master) and the motion controller (SPI slave), plus the
//! slave-side transport discipline.
//!
//! # Protocol Overview
//!
//! Every message has a fixed length and layout:
//! ```text
//! ┌────────┬──────┬──────────┬──────────────┬────────┬──────┐
//! │ HEADER │ TYPE │ FRAME ID │ PAYLOAD      │ PARITY │ TAIL │
//! │ 1B     │ 1B   │ 1B       │ 0–37B        │ 0–1B   │ 1B   │
//! └────────┴──────┴──────────┴──────────────┴────────┴──────┘
//! ```
//!
//! Requests and responses use distinct header/tail pairs. Multi-byte fields
//! are big-endian. Parity is message-specific: a whole-byte XOR, a single
//! bit folded into a payload byte, a "not used" stub, or absent.
//!
//! Each SPI transfer exchanges a fixed 42-byte buffer. When the slave has no
//! response to send, it pads its transmit buffer with a READY or BUSY
//! handshake byte.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod error;
pub mod fifo;
pub mod handshake;
pub mod link;
pub mod messages;
pub mod router;
pub mod wire;

pub use error::Error;
pub use fifo::{ResponseQueue, RESPONSE_QUEUE_DEPTH};
pub use handshake::{prime, status_for_occupancy, PrimeOutcome};
pub use link::{Capture, LinkStats, Overflow, SpiLink, RX_QUEUE_DEPTH};
pub use messages::{AckStatus, Message, MessageKind};
pub use router::{FrameHandler, Router};
pub use wire::{
    MASTER_POLL, MAX_FRAME_LEN, REQUEST_HEADER, REQUEST_TAIL, RESPONSE_HEADER, RESPONSE_TAIL,
    STATUS_BUSY, STATUS_READY, TRANSFER_SIZE,
};
