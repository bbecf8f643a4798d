//! Drive tuning messages: microstep resolution and friction compensation

use super::{Message, MSG_AUTO_FRICTION, MSG_MICROSTEPS};
use crate::error::Error;
use crate::wire::{
    check_byte_parity, check_frame, read_u16, stamp_byte_parity, stamp_frame, write_u16, Role,
    FRAME_ID_OFFSET,
};

/// Set the microstep resolution (host → controller)
///
/// `[0] header [1] type [2] frame id [3..5] microsteps [5] parity [6] tail`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Microsteps {
    pub frame_id: u8,
    pub microsteps: u16,
}

impl Message for Microsteps {
    const TYPE: u8 = MSG_MICROSTEPS;
    const LEN: usize = 7;
    const ROLE: Role = Role::Request;

    fn frame_id(&self) -> u8 {
        self.frame_id
    }

    fn decode(buf: &[u8]) -> Result<Self, Error> {
        check_frame(buf, Self::ROLE, Self::TYPE, Self::LEN)?;
        if !check_byte_parity(buf, 5) {
            return Err(Error::Frame);
        }
        Ok(Self {
            frame_id: buf[FRAME_ID_OFFSET],
            microsteps: read_u16(buf, 3),
        })
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let frame = stamp_frame(buf, Self::ROLE, Self::TYPE, self.frame_id, Self::LEN)?;
        write_u16(frame, 3, self.microsteps);
        stamp_byte_parity(frame, 5);
        Ok(Self::LEN)
    }
}

/// Enable or disable the friction model (host → controller)
///
/// ```text
/// [0] header [1] type [2] frame id [3] enable [4..6] coulomb offset
/// [6] viscous q8 [7] parity [8] tail
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AutoFriction {
    pub frame_id: u8,
    pub enable: bool,
    /// Velocity below which no motion is commanded, steps per second
    pub coulomb_offset: u16,
    /// Viscous loss as a fraction of 256
    pub viscous_q8: u8,
}

impl Message for AutoFriction {
    const TYPE: u8 = MSG_AUTO_FRICTION;
    const LEN: usize = 9;
    const ROLE: Role = Role::Request;

    fn frame_id(&self) -> u8 {
        self.frame_id
    }

    fn decode(buf: &[u8]) -> Result<Self, Error> {
        check_frame(buf, Self::ROLE, Self::TYPE, Self::LEN)?;
        if !check_byte_parity(buf, 7) {
            return Err(Error::Frame);
        }
        Ok(Self {
            frame_id: buf[FRAME_ID_OFFSET],
            enable: buf[3] != 0,
            coulomb_offset: read_u16(buf, 4),
            viscous_q8: buf[6],
        })
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let frame = stamp_frame(buf, Self::ROLE, Self::TYPE, self.frame_id, Self::LEN)?;
        frame[3] = self.enable as u8;
        write_u16(frame, 4, self.coulomb_offset);
        frame[6] = self.viscous_q8;
        stamp_byte_parity(frame, 7);
        Ok(Self::LEN)
    }
}
