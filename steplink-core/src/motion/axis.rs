//! Per-axis runtime state
//!
//! Step pulse timing, the DDA phase accumulator, step counters and the
//! velocity ramp of one axis.

use steplink_hal::Direction;
use steplink_protocol::messages::PidGains;

use super::ramp::Ramp;
use crate::fixed::Phase;

/// Runtime state of one axis
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisState {
    /// Steps in the active segment
    pub total_steps: u32,
    /// Steps emitted so far in the active segment
    pub emitted_steps: u32,
    /// Control-loop step target, mirrors `emitted_steps`
    pub target_steps: u32,
    /// Velocity requested by the segment (capped), steps/s
    pub commanded_velocity: u32,
    pub gains: PidGains,
    pub direction: Direction,
    /// Signed step position since the last origin reset
    pub commanded_position: i64,
    /// Step ticks left with the step line high
    pub pulse_high: u16,
    /// Step ticks left before the next pulse may start
    pub pulse_low: u16,
    /// Step ticks left after a driver enable
    pub enable_settle: u16,
    /// Step ticks left after a direction change
    pub dir_settle: u16,
    pub phase: Phase,
    pub phase_increment: Phase,
    pub ramp: Ramp,
    /// Velocity after correction, throttle and friction, steps/s
    pub output_velocity: u32,
    /// Driver enable line state
    pub enabled: bool,
}

impl AxisState {
    /// Load a new segment
    ///
    /// The ramp is left untouched so chained segments keep their velocity.
    pub fn load(&mut self, steps: u32, velocity: u32, gains: PidGains) {
        self.total_steps = steps;
        self.emitted_steps = 0;
        self.target_steps = 0;
        self.commanded_velocity = velocity;
        self.gains = gains;
        self.phase = Phase::ZERO;
    }

    /// Steps left in the active segment
    pub fn remaining(&self) -> u32 {
        self.total_steps - self.emitted_steps
    }

    pub fn is_complete(&self) -> bool {
        self.emitted_steps >= self.total_steps
    }

    pub fn is_pulse_high(&self) -> bool {
        self.pulse_high > 0
    }

    /// Whether a pulse or settle hold stops the next step
    pub fn is_blocked(&self) -> bool {
        self.pulse_high > 0 || self.pulse_low > 0 || self.enable_settle > 0 || self.dir_settle > 0
    }

    /// Count down the pulse and settle holds
    ///
    /// Returns `true` when the high hold just expired and the step line must
    /// be lowered.
    pub fn close_pulse(&mut self, low_ticks: u16) -> bool {
        let mut lower = false;
        if self.pulse_high > 0 {
            self.pulse_high -= 1;
            if self.pulse_high == 0 {
                self.pulse_low = low_ticks;
                lower = true;
            }
        } else if self.pulse_low > 0 {
            self.pulse_low -= 1;
        }
        self.enable_settle = self.enable_settle.saturating_sub(1);
        self.dir_settle = self.dir_settle.saturating_sub(1);
        lower
    }

    /// Accumulate one tick of phase
    ///
    /// Returns `true` when a step is due; the caller raises the step line.
    pub fn accumulate(&mut self, pulse_ticks: u16) -> bool {
        if self.is_complete() || self.is_blocked() {
            return false;
        }
        if !self.phase.advance(self.phase_increment) {
            return false;
        }
        self.emitted_steps += 1;
        self.target_steps = self.emitted_steps;
        self.commanded_position += self.direction.sign();
        self.pulse_high = pulse_ticks;
        true
    }

    /// Segment completion, 0..=100
    pub fn completion_percent(&self) -> u8 {
        if self.total_steps == 0 {
            return 0;
        }
        (self.emitted_steps as u64 * 100 / self.total_steps as u64) as u8
    }

    /// Stop stepping and forget the segment
    ///
    /// Position, direction and driver state are kept.
    pub fn stop(&mut self) {
        self.total_steps = 0;
        self.emitted_steps = 0;
        self.target_steps = 0;
        self.commanded_velocity = 0;
        self.pulse_high = 0;
        self.pulse_low = 0;
        self.phase = Phase::ZERO;
        self.phase_increment = Phase::ZERO;
        self.ramp.stop();
        self.output_velocity = 0;
    }
}
