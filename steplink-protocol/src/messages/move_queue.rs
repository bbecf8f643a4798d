//! Move queue messages: enqueue a segment, query queue/engine status

use super::{AckStatus, Message, MSG_MOVE_QUEUE_ADD, MSG_MOVE_QUEUE_STATUS};
use crate::error::Error;
use crate::wire::{
    check_byte_parity, check_frame, read_u16, read_u32, stamp_byte_parity, stamp_frame,
    write_u16, write_u32, Role, FRAME_ID_OFFSET,
};

/// Per-axis position controller gains
///
/// Integer gains with an implied scale of 2⁻⁸ (256 = 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidGains {
    pub kp: u16,
    pub ki: u16,
    pub kd: u16,
}

impl PidGains {
    /// Create gains from raw scaled values
    pub const fn new(kp: u16, ki: u16, kd: u16) -> Self {
        Self { kp, ki, kd }
    }
}

/// Queue one move segment (host → controller)
///
/// Layout:
/// ```text
/// [0] header  [1] type  [2] frame id  [3] dir mask
/// [4..6] vx  [6..10] sx  [10..12] vy  [12..16] sy  [16..18] vz  [18..22] sz
/// [22..40] kp_x ki_x kd_x kp_y ki_y kd_y kp_z ki_z kd_z
/// [40] parity (XOR of 1..40)  [41] tail
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveQueueAdd {
    pub frame_id: u8,
    /// Bit n set: axis n travels in reverse
    pub dir_mask: u8,
    /// Commanded velocity per axis in steps per second
    pub velocity: [u16; 3],
    /// Step count per axis
    pub steps: [u32; 3],
    /// Position controller gains per axis
    pub gains: [PidGains; 3],
}

const ADD_DIR: usize = 3;
const ADD_AXES: usize = 4;
const ADD_AXIS_STRIDE: usize = 6;
const ADD_GAINS: usize = 22;
const ADD_PARITY: usize = 40;

impl Message for MoveQueueAdd {
    const TYPE: u8 = MSG_MOVE_QUEUE_ADD;
    const LEN: usize = 42;
    const ROLE: Role = Role::Request;

    fn frame_id(&self) -> u8 {
        self.frame_id
    }

    fn decode(buf: &[u8]) -> Result<Self, Error> {
        check_frame(buf, Self::ROLE, Self::TYPE, Self::LEN)?;
        if !check_byte_parity(buf, ADD_PARITY) {
            return Err(Error::Frame);
        }

        let mut msg = MoveQueueAdd {
            frame_id: buf[FRAME_ID_OFFSET],
            dir_mask: buf[ADD_DIR],
            ..Default::default()
        };
        for axis in 0..3 {
            let base = ADD_AXES + axis * ADD_AXIS_STRIDE;
            msg.velocity[axis] = read_u16(buf, base);
            msg.steps[axis] = read_u32(buf, base + 2);

            let gains = ADD_GAINS + axis * 6;
            msg.gains[axis] = PidGains {
                kp: read_u16(buf, gains),
                ki: read_u16(buf, gains + 2),
                kd: read_u16(buf, gains + 4),
            };
        }
        Ok(msg)
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let frame = stamp_frame(buf, Self::ROLE, Self::TYPE, self.frame_id, Self::LEN)?;
        frame[ADD_DIR] = self.dir_mask;
        for axis in 0..3 {
            let base = ADD_AXES + axis * ADD_AXIS_STRIDE;
            write_u16(frame, base, self.velocity[axis]);
            write_u32(frame, base + 2, self.steps[axis]);

            let gains = ADD_GAINS + axis * 6;
            write_u16(frame, gains, self.gains[axis].kp);
            write_u16(frame, gains + 2, self.gains[axis].ki);
            write_u16(frame, gains + 4, self.gains[axis].kd);
        }
        stamp_byte_parity(frame, ADD_PARITY);
        Ok(Self::LEN)
    }
}

/// Acknowledge a queued segment (controller → host)
///
/// `[0] header [1] type [2] frame id [3] status [4] queue depth [5] parity [6] tail`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveQueueAddAck {
    pub frame_id: u8,
    pub status: AckStatus,
    /// Queued segments after this request, clamped to a byte
    pub queue_depth: u8,
}

impl Message for MoveQueueAddAck {
    const TYPE: u8 = MSG_MOVE_QUEUE_ADD;
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
            status: AckStatus::from_byte(buf[3]).ok_or(Error::Frame)?,
            queue_depth: buf[4],
        })
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let frame = stamp_frame(buf, Self::ROLE, Self::TYPE, self.frame_id, Self::LEN)?;
        frame[3] = self.status.to_byte();
        frame[4] = self.queue_depth;
        stamp_byte_parity(frame, 5);
        Ok(Self::LEN)
    }
}

/// Query engine and queue status (host → controller)
///
/// `[0] header [1] type [2] frame id [3] parity (not used) [4] tail`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveQueueStatus {
    pub frame_id: u8,
}

impl Message for MoveQueueStatus {
    const TYPE: u8 = MSG_MOVE_QUEUE_STATUS;
    const LEN: usize = 5;
    const ROLE: Role = Role::Request;

    fn frame_id(&self) -> u8 {
        self.frame_id
    }

    fn decode(buf: &[u8]) -> Result<Self, Error> {
        check_frame(buf, Self::ROLE, Self::TYPE, Self::LEN)?;
        // Byte 3 is a parity stub; any value is accepted
        Ok(Self {
            frame_id: buf[FRAME_ID_OFFSET],
        })
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize, Error> {
        stamp_frame(buf, Self::ROLE, Self::TYPE, self.frame_id, Self::LEN)?;
        Ok(Self::LEN)
    }
}

/// Engine and queue status snapshot (controller → host)
///
/// ```text
/// [0] header [1] type [2] frame id [3] state [4] queue depth
/// [5..8] completion % x/y/z  [8..11] position error x/y/z (i8)
/// [11] parity (XOR of 1..11) [12] tail
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveQueueStatusReply {
    pub frame_id: u8,
    /// Motion state code
    pub state: u8,
    pub queue_depth: u8,
    /// Completion of the active segment per axis, 0..=100
    pub completion: [u8; 3],
    /// Position error per axis in steps, clamped
    pub position_error: [i8; 3],
}

impl Message for MoveQueueStatusReply {
    const TYPE: u8 = MSG_MOVE_QUEUE_STATUS;
    const LEN: usize = 13;
    const ROLE: Role = Role::Response;

    fn frame_id(&self) -> u8 {
        self.frame_id
    }

    fn decode(buf: &[u8]) -> Result<Self, Error> {
        check_frame(buf, Self::ROLE, Self::TYPE, Self::LEN)?;
        if !check_byte_parity(buf, 11) {
            return Err(Error::Frame);
        }
        let mut reply = Self {
            frame_id: buf[FRAME_ID_OFFSET],
            state: buf[3],
            queue_depth: buf[4],
            ..Default::default()
        };
        for axis in 0..3 {
            reply.completion[axis] = buf[5 + axis];
            reply.position_error[axis] = buf[8 + axis] as i8;
        }
        Ok(reply)
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let frame = stamp_frame(buf, Self::ROLE, Self::TYPE, self.frame_id, Self::LEN)?;
        frame[3] = self.state;
        frame[4] = self.queue_depth;
        for axis in 0..3 {
            frame[5 + axis] = self.completion[axis];
            frame[8 + axis] = self.position_error[axis] as u8;
        }
        stamp_byte_parity(frame, 11);
        Ok(Self::LEN)
    }
}
