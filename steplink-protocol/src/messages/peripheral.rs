//! Auxiliary peripheral messages: status LED, homing, probe level

use super::{Message, MSG_HOME, MSG_LED_CONTROL, MSG_PROBE_LEVEL};
use crate::error::Error;
use crate::wire::{
    check_bit_parity, check_byte_parity, check_frame, read_u16, stamp_bit_parity,
    stamp_byte_parity, stamp_frame, write_u16, Role, FRAME_ID_OFFSET, PARITY_BIT,
};

/// LED drive mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LedMode {
    Off = 0,
    On = 1,
    Blink = 2,
}

impl LedMode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(LedMode::Off),
            1 => Some(LedMode::On),
            2 => Some(LedMode::Blink),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Drive an indicator LED (host → controller)
///
/// `[0] header [1] type [2] frame id [3] led [4] mode (bits 0-6), parity bit 7 [5] tail`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedControl {
    pub frame_id: u8,
    pub led: u8,
    pub mode: LedMode,
}

impl Message for LedControl {
    const TYPE: u8 = MSG_LED_CONTROL;
    const LEN: usize = 6;
    const ROLE: Role = Role::Request;

    fn frame_id(&self) -> u8 {
        self.frame_id
    }

    fn decode(buf: &[u8]) -> Result<Self, Error> {
        check_frame(buf, Self::ROLE, Self::TYPE, Self::LEN)?;
        if !check_bit_parity(buf, 4) {
            return Err(Error::Frame);
        }
        Ok(Self {
            frame_id: buf[FRAME_ID_OFFSET],
            led: buf[3],
            mode: LedMode::from_byte(buf[4] & !PARITY_BIT).ok_or(Error::Frame)?,
        })
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let frame = stamp_frame(buf, Self::ROLE, Self::TYPE, self.frame_id, Self::LEN)?;
        frame[3] = self.led;
        frame[4] = self.mode.to_byte();
        stamp_bit_parity(frame, 4);
        Ok(Self::LEN)
    }
}

/// Run the homing cycle on selected axes (host → controller)
///
/// `[0] header [1] type [2] frame id [3] axis mask [4] dir mask [5..7] velocity [7] parity [8] tail`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Home {
    pub frame_id: u8,
    pub axis_mask: u8,
    pub dir_mask: u8,
    /// Homing speed in steps per second
    pub velocity: u16,
}

impl Message for Home {
    const TYPE: u8 = MSG_HOME;
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
            axis_mask: buf[3],
            dir_mask: buf[4],
            velocity: read_u16(buf, 5),
        })
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let frame = stamp_frame(buf, Self::ROLE, Self::TYPE, self.frame_id, Self::LEN)?;
        frame[3] = self.axis_mask;
        frame[4] = self.dir_mask;
        write_u16(frame, 5, self.velocity);
        stamp_byte_parity(frame, 7);
        Ok(Self::LEN)
    }
}

/// Read the bed probe (host → controller)
///
/// `[0] header [1] type [2] frame id [3] parity (not used) [4] tail`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProbeLevel {
    pub frame_id: u8,
}

impl Message for ProbeLevel {
    const TYPE: u8 = MSG_PROBE_LEVEL;
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

/// Probe reading (controller → host)
///
/// `[0] header [1] type [2] frame id [3..5] level [5] parity [6] tail`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProbeLevelReply {
    pub frame_id: u8,
    pub level: u16,
}

impl Message for ProbeLevelReply {
    const TYPE: u8 = MSG_PROBE_LEVEL;
    const LEN: usize = 7;
    const ROLE: Role = Role::Response;

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
            level: read_u16(buf, 3),
        })
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let frame = stamp_frame(buf, Self::ROLE, Self::TYPE, self.frame_id, Self::LEN)?;
        write_u16(frame, 3, self.level);
        stamp_byte_parity(frame, 5);
        Ok(Self::LEN)
    }
}
