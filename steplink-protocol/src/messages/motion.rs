//! Motion control messages: start the queue, end the active move

use super::{Message, MSG_MOVE_END, MSG_START_MOVE};
use crate::error::Error;
use crate::wire::{
    check_byte_parity, check_frame, stamp_byte_parity, stamp_frame, Role, FRAME_ID_OFFSET,
};

/// Begin executing queued segments (host → controller)
///
/// `[0] header [1] type [2] frame id [3] tail`, no parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StartMove {
    pub frame_id: u8,
}

impl Message for StartMove {
    const TYPE: u8 = MSG_START_MOVE;
    const LEN: usize = 4;
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

/// Stop the active move and flush the queue (host → controller)
///
/// `[0] header [1] type [2] frame id [3] parity (not used) [4] tail`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveEnd {
    pub frame_id: u8,
}

impl Message for MoveEnd {
    const TYPE: u8 = MSG_MOVE_END;
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

/// Why the engine stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MoveEndReason {
    /// Every segment ran to completion
    Completed = 0,
    /// Ramped down on request
    Stopped = 1,
    /// Halted without a ramp
    EmergencyStop = 2,
}

impl MoveEndReason {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(MoveEndReason::Completed),
            1 => Some(MoveEndReason::Stopped),
            2 => Some(MoveEndReason::EmergencyStop),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Reply to [`MoveEnd`] (controller → host)
///
/// `[0] header [1] type [2] frame id [3] reason [4] parity [5] tail`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveEndReply {
    pub frame_id: u8,
    pub reason: MoveEndReason,
}

impl Message for MoveEndReply {
    const TYPE: u8 = MSG_MOVE_END;
    const LEN: usize = 6;
    const ROLE: Role = Role::Response;

    fn frame_id(&self) -> u8 {
        self.frame_id
    }

    fn decode(buf: &[u8]) -> Result<Self, Error> {
        check_frame(buf, Self::ROLE, Self::TYPE, Self::LEN)?;
        if !check_byte_parity(buf, 4) {
            return Err(Error::Frame);
        }
        Ok(Self {
            frame_id: buf[FRAME_ID_OFFSET],
            reason: MoveEndReason::from_byte(buf[3]).ok_or(Error::Frame)?,
        })
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let frame = stamp_frame(buf, Self::ROLE, Self::TYPE, self.frame_id, Self::LEN)?;
        frame[3] = self.reason.to_byte();
        stamp_byte_parity(frame, 4);
        Ok(Self::LEN)
    }
}
