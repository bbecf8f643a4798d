//! Encoder messages: origin reset and absolute position readout

use super::{Message, MSG_ENCODER_STATUS, MSG_SET_ORIGIN};
use crate::error::Error;
use crate::wire::{
    check_bit_parity, check_byte_parity, check_frame, read_i64, stamp_bit_parity,
    stamp_byte_parity, stamp_frame, write_i64, Role, FRAME_ID_OFFSET,
};

/// Axis bits carried in the mask byte
const AXIS_MASK_BITS: u8 = 0x07;

/// Zero the absolute position of selected axes (host → controller)
///
/// `[0] header [1] type [2] frame id [3] axis mask (bits 0-2), parity bit 7 [4] tail`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetOrigin {
    pub frame_id: u8,
    pub axis_mask: u8,
}

impl Message for SetOrigin {
    const TYPE: u8 = MSG_SET_ORIGIN;
    const LEN: usize = 5;
    const ROLE: Role = Role::Request;

    fn frame_id(&self) -> u8 {
        self.frame_id
    }

    fn decode(buf: &[u8]) -> Result<Self, Error> {
        check_frame(buf, Self::ROLE, Self::TYPE, Self::LEN)?;
        if !check_bit_parity(buf, 3) {
            return Err(Error::Frame);
        }
        Ok(Self {
            frame_id: buf[FRAME_ID_OFFSET],
            axis_mask: buf[3] & AXIS_MASK_BITS,
        })
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let frame = stamp_frame(buf, Self::ROLE, Self::TYPE, self.frame_id, Self::LEN)?;
        frame[3] = self.axis_mask & AXIS_MASK_BITS;
        stamp_bit_parity(frame, 3);
        Ok(Self::LEN)
    }
}

/// Request absolute encoder positions (host → controller)
///
/// `[0] header [1] type [2] frame id [3] parity (not used) [4] tail`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderStatus {
    pub frame_id: u8,
}

impl Message for EncoderStatus {
    const TYPE: u8 = MSG_ENCODER_STATUS;
    const LEN: usize = 5;
    const ROLE: Role = Role::Request;

    fn frame_id(&self) -> u8 {
        self.frame_id
    }

    fn decode(buf: &[u8]) -> Result<Self, Error> {
        check_frame(buf, Self::ROLE, Self::TYPE, Self::LEN)?;
        Ok(Self {
            frame_id: buf[FRAME_ID_OFFSET],
        })
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize, Error> {
        stamp_frame(buf, Self::ROLE, Self::TYPE, self.frame_id, Self::LEN)?;
        Ok(Self::LEN)
    }
}

/// Absolute encoder positions relative to the origin (controller → host)
///
/// `[0] header [1] type [2] frame id [3..11] x [11..19] y [19..27] z [27] parity [28] tail`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderStatusReply {
    pub frame_id: u8,
    pub positions: [i64; 3],
}

impl Message for EncoderStatusReply {
    const TYPE: u8 = MSG_ENCODER_STATUS;
    const LEN: usize = 29;
    const ROLE: Role = Role::Response;

    fn frame_id(&self) -> u8 {
        self.frame_id
    }

    fn decode(buf: &[u8]) -> Result<Self, Error> {
        check_frame(buf, Self::ROLE, Self::TYPE, Self::LEN)?;
        if !check_byte_parity(buf, 27) {
            return Err(Error::Frame);
        }
        let mut positions = [0i64; 3];
        for (axis, position) in positions.iter_mut().enumerate() {
            *position = read_i64(buf, 3 + axis * 8);
        }
        Ok(Self {
            frame_id: buf[FRAME_ID_OFFSET],
            positions,
        })
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let frame = stamp_frame(buf, Self::ROLE, Self::TYPE, self.frame_id, Self::LEN)?;
        for (axis, &position) in self.positions.iter().enumerate() {
            write_i64(frame, 3 + axis * 8, position);
        }
        stamp_byte_parity(frame, 27);
        Ok(Self::LEN)
    }
}
