//! Motion hardware capability
//!
//! The complete set of hardware operations the motion engine performs:
//! direction, driver enable, the step line, and raw encoder reads.

use crate::encoder::CounterWidth;

/// Number of motion axes
pub const AXIS_COUNT: usize = 3;

/// Motion axis identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in index order
    pub const ALL: [Axis; AXIS_COUNT] = [Axis::X, Axis::Y, Axis::Z];

    /// Array index of this axis
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Axis for an array index
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Axis::X),
            1 => Some(Axis::Y),
            2 => Some(Axis::Z),
            _ => None,
        }
    }

    /// Bit of this axis in a wire axis mask
    pub const fn mask(self) -> u8 {
        1 << self.index()
    }
}

/// Direction of travel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Positive travel (direction line low)
    #[default]
    Forward,
    /// Negative travel (direction line high)
    Reverse,
}

impl Direction {
    /// Decode the direction of `axis` from a wire direction mask
    ///
    /// A set bit means reverse travel.
    pub const fn from_mask(mask: u8, axis: Axis) -> Self {
        if mask & axis.mask() != 0 {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }

    /// Sign of one step in this direction
    pub const fn sign(self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }
}

/// Hardware capability used by the motion engine
///
/// Every method is called from interrupt context (step tick or control
/// tick) and must complete in bounded time without blocking.
pub trait MotionHardware {
    /// Drive the direction line of an axis
    fn set_direction(&mut self, axis: Axis, direction: Direction);

    /// Enable or disable the stepper driver of an axis
    fn set_enabled(&mut self, axis: Axis, enabled: bool);

    /// Raise (`true`) or lower (`false`) the step line of an axis
    fn set_step(&mut self, axis: Axis, high: bool);

    /// Read the raw encoder counter of an axis
    ///
    /// Axes without an encoder return 0.
    fn read_encoder(&mut self, axis: Axis) -> u32;

    /// Width of the encoder counter of an axis
    fn encoder_width(&self, axis: Axis) -> CounterWidth;
}
