//! Motion state machine
//!
//! The engine state is a function of the previous state and a trigger.
//! Guards (is anything queued, is a segment active) live in the engine;
//! this table only says where each trigger leads.

/// Engine states, with their wire codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MotionState {
    /// Nothing queued, nothing moving
    #[default]
    Idle = 0,
    /// Segments queued, waiting for start
    Queued = 1,
    /// Executing segments
    Running = 2,
    /// Execution suspended, segment kept
    Paused = 3,
    /// Stop in progress
    Stopping = 4,
    /// Every queued segment has run
    Done = 5,
    /// Fault; outputs disabled
    Error = 6,
}

/// Inputs to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    /// A segment was queued
    Enqueued,
    /// Start requested and there is a segment to run
    Started,
    /// Pause requested
    Pause,
    /// Active segment and queue both exhausted
    Exhausted,
    /// Move end or emergency stop requested
    StopRequested,
    /// Stop finished
    Stopped,
    /// Fault detected
    Fault,
}

impl MotionState {
    /// Wire code of this state
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Whether segments are being executed or held mid-segment
    pub fn is_moving(&self) -> bool {
        matches!(
            self,
            MotionState::Running | MotionState::Paused | MotionState::Stopping
        )
    }

    /// Whether the step tick should emit steps
    pub fn steps_allowed(&self) -> bool {
        matches!(self, MotionState::Running)
    }

    /// Process a trigger and return the next state
    pub fn transition(self, trigger: Trigger) -> Self {
        use MotionState::*;
        use Trigger::*;

        match (self, trigger) {
            // Faults win from any state
            (_, Fault) => Error,

            // Enqueue
            (Idle, Enqueued) | (Done, Enqueued) => Queued,

            // Start
            (Queued, Started) | (Done, Started) | (Paused, Started) | (Idle, Started) => Running,

            // Pause
            (Running, Pause) => Paused,

            // Natural completion
            (Running, Exhausted) => Done,

            // Two-phase stop
            (_, StopRequested) => Stopping,
            (Stopping, Stopped) => Idle,

            // Default: stay in current state
            _ => self,
        }
    }
}
