//! Byte-level framing primitives
//!
//! Constants, parity helpers, big-endian field access and header/tail
//! stamping shared by every message codec.

use crate::error::Error;

/// First byte of every request frame
pub const REQUEST_HEADER: u8 = 0xA5;

/// Last byte of every request frame
pub const REQUEST_TAIL: u8 = 0x5A;

/// First byte of every response frame
pub const RESPONSE_HEADER: u8 = 0xB6;

/// Last byte of every response frame
pub const RESPONSE_TAIL: u8 = 0x6B;

/// Handshake byte: slave can accept another request
pub const STATUS_READY: u8 = 0xC3;

/// Handshake byte: slave receive queue is full
pub const STATUS_BUSY: u8 = 0xCC;

/// Master transfer that carries no request (poll only)
pub const MASTER_POLL: u8 = 0xF0;

/// Size of every SPI duplex transfer
pub const TRANSFER_SIZE: usize = 42;

/// Longest frame on the wire
pub const MAX_FRAME_LEN: usize = 42;

/// Shortest frame on the wire (header, type, frame id, tail)
pub const MIN_FRAME_LEN: usize = 4;

/// Offset of the message type byte
pub const TYPE_OFFSET: usize = 1;

/// Offset of the frame id byte
pub const FRAME_ID_OFFSET: usize = 2;

/// First offset at which a tail byte can end a frame
pub const TAIL_SCAN_START: usize = MIN_FRAME_LEN - 1;

/// Bit used by single-bit parity fields
pub const PARITY_BIT: u8 = 0x80;

/// Which side of the link a frame belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// Host to controller
    Request,
    /// Controller to host
    Response,
}

impl Role {
    /// Header byte for this role
    pub const fn header(self) -> u8 {
        match self {
            Role::Request => REQUEST_HEADER,
            Role::Response => RESPONSE_HEADER,
        }
    }

    /// Tail byte for this role
    pub const fn tail(self) -> u8 {
        match self {
            Role::Request => REQUEST_TAIL,
            Role::Response => RESPONSE_TAIL,
        }
    }
}

/// Whole-byte XOR reduction of a byte range
pub fn xor_parity(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, &b| acc ^ b)
}

/// Bit-reduced XOR of a byte range
///
/// Returns `true` when the range holds an odd number of set bits.
pub fn bit_parity(bytes: &[u8]) -> bool {
    xor_parity(bytes).count_ones() & 1 == 1
}

/// Write the byte parity of `frame[1..at]` into `frame[at]`
pub fn stamp_byte_parity(frame: &mut [u8], at: usize) {
    frame[at] = xor_parity(&frame[TYPE_OFFSET..at]);
}

/// Check the byte parity written by [`stamp_byte_parity`]
pub fn check_byte_parity(frame: &[u8], at: usize) -> bool {
    frame[at] == xor_parity(&frame[TYPE_OFFSET..at])
}

/// Fold the bit parity of `frame[1..=at]` into bit 7 of `frame[at]`
///
/// Bit 7 of `frame[at]` is excluded from the range it protects.
pub fn stamp_bit_parity(frame: &mut [u8], at: usize) {
    frame[at] &= !PARITY_BIT;
    if bit_parity(&frame[TYPE_OFFSET..=at]) {
        frame[at] |= PARITY_BIT;
    }
}

/// Check the parity bit written by [`stamp_bit_parity`]
pub fn check_bit_parity(frame: &[u8], at: usize) -> bool {
    let covered = xor_parity(&frame[TYPE_OFFSET..at]) ^ (frame[at] & !PARITY_BIT);
    let expected = covered.count_ones() & 1 == 1;
    expected == (frame[at] & PARITY_BIT != 0)
}

/// Read a big-endian u16
pub fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

/// Read a big-endian u32
pub fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_be_bytes(bytes)
}

/// Read a big-endian i64
pub fn read_i64(buf: &[u8], offset: usize) -> i64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    i64::from_be_bytes(bytes)
}

/// Write a big-endian u16
pub fn write_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

/// Write a big-endian u32
pub fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

/// Write a big-endian i64
pub fn write_i64(buf: &mut [u8], offset: usize, value: i64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_be_bytes());
}

/// Validate the fixed envelope of a frame
///
/// Fails with [`Error::InvalidArgument`] when `buf` is empty or shorter than
/// `len`, and with [`Error::Frame`] on a length, header, type or tail
/// mismatch.
pub fn check_frame(buf: &[u8], role: Role, msg_type: u8, len: usize) -> Result<(), Error> {
    if buf.is_empty() || buf.len() < len {
        return Err(Error::InvalidArgument);
    }
    if buf.len() != len
        || buf[0] != role.header()
        || buf[TYPE_OFFSET] != msg_type
        || buf[len - 1] != role.tail()
    {
        return Err(Error::Frame);
    }
    Ok(())
}

/// Zero the first `len` bytes of `buf` and stamp header, type, frame id and
/// tail
///
/// Returns the frame slice for the caller to fill in.
pub fn stamp_frame(
    buf: &mut [u8],
    role: Role,
    msg_type: u8,
    frame_id: u8,
    len: usize,
) -> Result<&mut [u8], Error> {
    if buf.len() < len {
        return Err(Error::InvalidArgument);
    }
    let frame = &mut buf[..len];
    frame.fill(0);
    frame[0] = role.header();
    frame[TYPE_OFFSET] = msg_type;
    frame[FRAME_ID_OFFSET] = frame_id;
    frame[len - 1] = role.tail();
    Ok(frame)
}
