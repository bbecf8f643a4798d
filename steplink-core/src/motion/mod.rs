//! Motion control
//!
//! The engine and the pieces it is built from:
//!
//! - [`queue`] - bounded FIFO of move segments
//! - [`axis`] - pulse timing and DDA per axis
//! - [`ramp`] - trapezoidal velocity profile
//! - [`encoder`] - wrap-safe encoder position
//! - [`pid`] - position controller
//! - [`state`] - engine state machine

pub mod axis;
pub mod encoder;
pub mod engine;
pub mod pid;
pub mod queue;
pub mod ramp;
pub mod state;

pub use axis::AxisState;
pub use encoder::EncoderState;
pub use engine::{MotionEngine, MotionEvent, MotionStatus};
pub use pid::PositionPid;
pub use queue::{MoveQueue, MoveSegment, MOVE_QUEUE_DEPTH};
pub use ramp::{Ramp, RampPhase};
pub use state::{MotionState, Trigger};
