//! Position controller
//!
//! Integer PID on the following error of one axis. Gains come with each
//! segment and carry an implied scale of 2⁻⁸. The output is a velocity
//! correction in steps/s.

use steplink_protocol::messages::PidGains;

use crate::config::PidLimits;
use crate::fixed::GAIN_SHIFT;

/// Controller state for one axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PositionPid {
    integral: i64,
    prev_error: i64,
    /// Low-pass filtered error derivative
    derivative: i64,
    /// Last output hit the limit
    saturated: bool,
}

impl PositionPid {
    pub const fn new() -> Self {
        Self {
            integral: 0,
            prev_error: 0,
            derivative: 0,
            saturated: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn integral(&self) -> i64 {
        self.integral
    }

    pub fn is_saturated(&self) -> bool {
        self.saturated
    }

    /// Run one control step
    ///
    /// `error` is commanded minus measured position in steps, positive when
    /// the axis lags in its direction of travel.
    pub fn update(&mut self, error: i64, gains: PidGains, limits: &PidLimits) -> i64 {
        let error = if error.abs() <= limits.deadband as i64 {
            0
        } else {
            error
        };

        // Integration is frozen while the output is pinned at the limit
        if !self.saturated {
            let clamp = limits.integral_clamp as i64;
            self.integral = (self.integral + error).clamp(-clamp, clamp);
        }

        let raw_derivative = error - self.prev_error;
        self.prev_error = error;
        self.derivative += (raw_derivative - self.derivative) >> limits.derivative_shift;

        let sum = gains.kp as i64 * error
            + gains.ki as i64 * self.integral
            + gains.kd as i64 * self.derivative;
        let output = sum >> GAIN_SHIFT;

        let limit = limits.output_limit as i64;
        let limited = output.clamp(-limit, limit);
        self.saturated = limited != output;
        limited
    }
}
