//! Generic acknowledgement response

use super::{
    Message, MSG_AUTO_FRICTION, MSG_HOME, MSG_LED_CONTROL, MSG_MICROSTEPS, MSG_SET_ORIGIN,
    MSG_START_MOVE,
};
use crate::error::Error;
use crate::wire::{
    check_byte_parity, check_frame, stamp_byte_parity, stamp_frame, Role, FRAME_ID_OFFSET,
};

/// Outcome carried by every acknowledgement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AckStatus {
    Ok = 0,
    /// The move queue has no free slot
    QueueFull = 1,
    /// Request not valid in the current motion state
    InvalidState = 2,
    /// A field is out of range
    InvalidArgument = 3,
    /// Request understood but not serviced
    Rejected = 4,
}

impl AckStatus {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(AckStatus::Ok),
            1 => Some(AckStatus::QueueFull),
            2 => Some(AckStatus::InvalidState),
            3 => Some(AckStatus::InvalidArgument),
            4 => Some(AckStatus::Rejected),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn is_ok(self) -> bool {
        self == AckStatus::Ok
    }
}

/// Status-only response for request type `T`
///
/// `[0] header [1] type [2] frame id [3] status [4] parity [5] tail`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ack<const T: u8> {
    pub frame_id: u8,
    pub status: AckStatus,
}

impl<const T: u8> Ack<T> {
    pub const fn new(frame_id: u8, status: AckStatus) -> Self {
        Self { frame_id, status }
    }

    pub const fn ok(frame_id: u8) -> Self {
        Self::new(frame_id, AckStatus::Ok)
    }
}

impl<const T: u8> Message for Ack<T> {
    const TYPE: u8 = T;
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
        let status = AckStatus::from_byte(buf[3]).ok_or(Error::Frame)?;
        Ok(Self::new(buf[FRAME_ID_OFFSET], status))
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let frame = stamp_frame(buf, Self::ROLE, Self::TYPE, self.frame_id, Self::LEN)?;
        frame[3] = self.status.to_byte();
        stamp_byte_parity(frame, 4);
        Ok(Self::LEN)
    }
}

pub type StartMoveAck = Ack<MSG_START_MOVE>;
pub type SetOriginAck = Ack<MSG_SET_ORIGIN>;
pub type LedControlAck = Ack<MSG_LED_CONTROL>;
pub type HomeAck = Ack<MSG_HOME>;
pub type MicrostepsAck = Ack<MSG_MICROSTEPS>;
pub type AutoFrictionAck = Ack<MSG_AUTO_FRICTION>;
