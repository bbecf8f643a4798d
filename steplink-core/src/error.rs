//! Engine and service error kinds

use core::fmt;

use steplink_protocol::AckStatus;

/// Errors returned by [`MotionEngine`](crate::motion::MotionEngine)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionError {
    /// Move queue has no free slot
    QueueFull,
    /// Start requested with no segment to run
    NothingQueued,
    /// Operation not allowed in the current motion state
    Busy,
    /// Segment or parameter out of range
    InvalidArgument,
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            MotionError::QueueFull => "move queue full",
            MotionError::NothingQueued => "nothing queued",
            MotionError::Busy => "not allowed while moving",
            MotionError::InvalidArgument => "invalid argument",
        };
        f.write_str(msg)
    }
}

impl From<MotionError> for AckStatus {
    fn from(err: MotionError) -> Self {
        match err {
            MotionError::QueueFull => AckStatus::QueueFull,
            MotionError::NothingQueued | MotionError::Busy => AckStatus::InvalidState,
            MotionError::InvalidArgument => AckStatus::InvalidArgument,
        }
    }
}

/// Errors returned by [`AuxServices`](crate::traits::AuxServices)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AuxError {
    /// The board has no such peripheral
    Unsupported,
    /// The peripheral is already in use
    Busy,
}

impl fmt::Display for AuxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuxError::Unsupported => f.write_str("peripheral not supported"),
            AuxError::Busy => f.write_str("peripheral busy"),
        }
    }
}

impl From<AuxError> for AckStatus {
    fn from(_: AuxError) -> Self {
        AckStatus::Rejected
    }
}
