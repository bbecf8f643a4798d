//! Message types for the Steplink protocol
//!
//! Every message has a fixed wire length. Requests flow host → controller,
//! responses flow controller → host and echo the request's type byte.
//!
//! | Type   | Request          | Len | Response              | Len |
//! |--------|------------------|-----|-----------------------|-----|
//! | `0x01` | MoveQueueAdd     | 42  | MoveQueueAddAck       | 7   |
//! | `0x02` | MoveQueueStatus  | 5   | MoveQueueStatusReply  | 13  |
//! | `0x03` | StartMove        | 4   | Ack                   | 6   |
//! | `0x04` | MoveEnd          | 5   | MoveEndReply          | 6   |
//! | `0x05` | SetOrigin        | 5   | Ack                   | 6   |
//! | `0x06` | EncoderStatus    | 5   | EncoderStatusReply    | 29  |
//! | `0x07` | LedControl       | 6   | Ack                   | 6   |
//! | `0x08` | Home             | 9   | Ack                   | 6   |
//! | `0x09` | ProbeLevel       | 5   | ProbeLevelReply       | 7   |
//! | `0x0A` | Microsteps       | 7   | Ack                   | 6   |
//! | `0x0B` | AutoFriction     | 9   | Ack                   | 6   |

use heapless::Vec;

use crate::error::Error;
use crate::wire::{Role, MAX_FRAME_LEN};

pub mod ack;
pub mod encoder;
pub mod motion;
pub mod move_queue;
pub mod peripheral;
pub mod tuning;

pub use ack::{
    Ack, AckStatus, AutoFrictionAck, HomeAck, LedControlAck, MicrostepsAck, SetOriginAck,
    StartMoveAck,
};
pub use encoder::{EncoderStatus, EncoderStatusReply, SetOrigin};
pub use motion::{MoveEnd, MoveEndReason, MoveEndReply, StartMove};
pub use move_queue::{
    MoveQueueAdd, MoveQueueAddAck, MoveQueueStatus, MoveQueueStatusReply, PidGains,
};
pub use peripheral::{Home, LedControl, LedMode, ProbeLevel, ProbeLevelReply};
pub use tuning::{AutoFriction, Microsteps};

// Message type IDs (shared by a request and its response)
pub const MSG_MOVE_QUEUE_ADD: u8 = 0x01;
pub const MSG_MOVE_QUEUE_STATUS: u8 = 0x02;
pub const MSG_START_MOVE: u8 = 0x03;
pub const MSG_MOVE_END: u8 = 0x04;
pub const MSG_SET_ORIGIN: u8 = 0x05;
pub const MSG_ENCODER_STATUS: u8 = 0x06;
pub const MSG_LED_CONTROL: u8 = 0x07;
pub const MSG_HOME: u8 = 0x08;
pub const MSG_PROBE_LEVEL: u8 = 0x09;
pub const MSG_MICROSTEPS: u8 = 0x0A;
pub const MSG_AUTO_FRICTION: u8 = 0x0B;

/// A fixed-layout wire message
pub trait Message: Sized {
    /// Message type byte
    const TYPE: u8;
    /// Total wire length including header and tail
    const LEN: usize;
    /// Request or response framing
    const ROLE: Role;

    /// Frame id carried in byte 2
    fn frame_id(&self) -> u8;

    /// Decode from exactly [`Self::LEN`] bytes
    fn decode(buf: &[u8]) -> Result<Self, Error>;

    /// Encode into the front of `buf`
    ///
    /// Returns the number of bytes written.
    fn encode(&self, buf: &mut [u8]) -> Result<usize, Error>;

    /// Encode into a heapless Vec
    fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_LEN>, Error> {
        let mut buffer = [0u8; MAX_FRAME_LEN];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| Error::Range)?;
        Ok(vec)
    }
}

/// Request message types, used by the router for dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageKind {
    MoveQueueAdd,
    MoveQueueStatus,
    StartMove,
    MoveEnd,
    SetOrigin,
    EncoderStatus,
    LedControl,
    Home,
    ProbeLevel,
    Microsteps,
    AutoFriction,
}

impl MessageKind {
    /// Parse a message kind from its type byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            MSG_MOVE_QUEUE_ADD => Some(MessageKind::MoveQueueAdd),
            MSG_MOVE_QUEUE_STATUS => Some(MessageKind::MoveQueueStatus),
            MSG_START_MOVE => Some(MessageKind::StartMove),
            MSG_MOVE_END => Some(MessageKind::MoveEnd),
            MSG_SET_ORIGIN => Some(MessageKind::SetOrigin),
            MSG_ENCODER_STATUS => Some(MessageKind::EncoderStatus),
            MSG_LED_CONTROL => Some(MessageKind::LedControl),
            MSG_HOME => Some(MessageKind::Home),
            MSG_PROBE_LEVEL => Some(MessageKind::ProbeLevel),
            MSG_MICROSTEPS => Some(MessageKind::Microsteps),
            MSG_AUTO_FRICTION => Some(MessageKind::AutoFriction),
            _ => None,
        }
    }

    /// Convert to the wire type byte
    pub fn to_byte(self) -> u8 {
        match self {
            MessageKind::MoveQueueAdd => MSG_MOVE_QUEUE_ADD,
            MessageKind::MoveQueueStatus => MSG_MOVE_QUEUE_STATUS,
            MessageKind::StartMove => MSG_START_MOVE,
            MessageKind::MoveEnd => MSG_MOVE_END,
            MessageKind::SetOrigin => MSG_SET_ORIGIN,
            MessageKind::EncoderStatus => MSG_ENCODER_STATUS,
            MessageKind::LedControl => MSG_LED_CONTROL,
            MessageKind::Home => MSG_HOME,
            MessageKind::ProbeLevel => MSG_PROBE_LEVEL,
            MessageKind::Microsteps => MSG_MICROSTEPS,
            MessageKind::AutoFriction => MSG_AUTO_FRICTION,
        }
    }

    /// Wire length of the request frame of this kind
    pub fn request_len(self) -> usize {
        match self {
            MessageKind::MoveQueueAdd => MoveQueueAdd::LEN,
            MessageKind::MoveQueueStatus => MoveQueueStatus::LEN,
            MessageKind::StartMove => StartMove::LEN,
            MessageKind::MoveEnd => MoveEnd::LEN,
            MessageKind::SetOrigin => SetOrigin::LEN,
            MessageKind::EncoderStatus => EncoderStatus::LEN,
            MessageKind::LedControl => LedControl::LEN,
            MessageKind::Home => Home::LEN,
            MessageKind::ProbeLevel => ProbeLevel::LEN,
            MessageKind::Microsteps => Microsteps::LEN,
            MessageKind::AutoFriction => AutoFriction::LEN,
        }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::Message;
    use crate::error::Error;
    use core::fmt::Debug;

    /// Check that `M::decode` rejects every envelope fault of a good frame
    pub fn assert_rejects_envelope<M: Message + Debug + PartialEq>(good: &[u8]) {
        assert_eq!(good.len(), M::LEN);
        assert!(M::decode(good).is_ok());

        assert_eq!(M::decode(&[]).unwrap_err(), Error::InvalidArgument);
        assert_eq!(M::decode(&good[..M::LEN - 1]).unwrap_err(), Error::InvalidArgument);

        let mut long = good.to_vec();
        long.push(0);
        assert_eq!(M::decode(&long).unwrap_err(), Error::Frame);

        let mut bad = good.to_vec();
        bad[0] ^= 0xFF;
        assert_eq!(M::decode(&bad).unwrap_err(), Error::Frame);

        let mut bad = good.to_vec();
        bad[1] ^= 0x40;
        assert_eq!(M::decode(&bad).unwrap_err(), Error::Frame);

        let mut bad = good.to_vec();
        bad[M::LEN - 1] ^= 0xFF;
        assert_eq!(M::decode(&bad).unwrap_err(), Error::Frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [MessageKind; 11] = [
        MessageKind::MoveQueueAdd,
        MessageKind::MoveQueueStatus,
        MessageKind::StartMove,
        MessageKind::MoveEnd,
        MessageKind::SetOrigin,
        MessageKind::EncoderStatus,
        MessageKind::LedControl,
        MessageKind::Home,
        MessageKind::ProbeLevel,
        MessageKind::Microsteps,
        MessageKind::AutoFriction,
    ];

    #[test]
    fn test_kind_roundtrip() {
        for kind in KINDS {
            assert_eq!(MessageKind::from_byte(kind.to_byte()), Some(kind));
        }
    }

    #[test]
    fn test_unknown_kind() {
        assert_eq!(MessageKind::from_byte(0x00), None);
        assert_eq!(MessageKind::from_byte(0x0C), None);
        assert_eq!(MessageKind::from_byte(0xFF), None);
    }

    #[test]
    fn test_request_lengths_fit_transfer() {
        for kind in KINDS {
            let len = kind.request_len();
            assert!(len >= crate::wire::MIN_FRAME_LEN);
            assert!(len <= MAX_FRAME_LEN);
        }
    }
}
