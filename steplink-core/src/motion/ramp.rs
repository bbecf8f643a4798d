//! Trapezoidal velocity ramp
//!
//! Updated once per control tick. Velocity changes by whole steps/s drawn
//! from a fractional accumulator, so low accelerations still make progress
//! at high control rates. Braking starts when the distance needed to stop
//! (`v²/2a`) covers the distance left, and stays latched until more work is
//! queued. Following a braking master axis is not latched: it holds only on
//! ticks where the master is still braking.

/// Current ramp phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RampPhase {
    /// Not moving
    #[default]
    Stopped,
    /// Speeding up toward target
    Accelerating,
    /// At target velocity
    Cruising,
    /// Slowing down, either to stop or to a lower target
    Decelerating,
}

/// Per-axis ramp inputs for one control tick
#[derive(Debug, Clone, Copy)]
pub struct RampInput {
    /// Velocity to settle at, steps/s
    pub target: u32,
    /// Steps left on this axis, active segment plus queue
    pub remaining: u64,
    /// The master axis is braking
    pub master_braking: bool,
    /// Acceleration, steps/s²
    pub acceleration: u32,
    /// Control tick rate in Hz
    pub control_hz: u32,
    /// Lowest running velocity, steps/s
    pub floor: u32,
}

/// Distance in steps needed to stop from `velocity` at `acceleration`
pub fn braking_distance(velocity: u32, acceleration: u32) -> u64 {
    if acceleration == 0 {
        return 0;
    }
    let v = velocity as u64;
    (v * v) / (2 * acceleration as u64)
}

/// Velocity ramp state for one axis
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ramp {
    velocity: u32,
    accumulator: u32,
    phase: RampPhase,
    braking: bool,
    last_remaining: u64,
}

impl Ramp {
    pub const fn new() -> Self {
        Self {
            velocity: 0,
            accumulator: 0,
            phase: RampPhase::Stopped,
            braking: false,
            last_remaining: 0,
        }
    }

    /// Current ramp velocity, steps/s
    pub fn velocity(&self) -> u32 {
        self.velocity
    }

    pub fn phase(&self) -> RampPhase {
        self.phase
    }

    /// Whether the ramp is braking toward its own stop
    pub fn is_braking(&self) -> bool {
        self.braking
    }

    /// Stop immediately
    pub fn stop(&mut self) {
        *self = Self::new();
    }

    /// Whole steps/s of velocity change earned this tick
    fn take_delta(&mut self, acceleration: u32, control_hz: u32) -> u32 {
        if control_hz == 0 {
            return 0;
        }
        self.accumulator = self.accumulator.saturating_add(acceleration);
        let delta = self.accumulator / control_hz;
        self.accumulator %= control_hz;
        delta
    }

    /// Advance one control tick and return the new velocity
    pub fn update(&mut self, input: RampInput) -> u32 {
        if input.remaining == 0 || input.target == 0 {
            self.stop();
            return 0;
        }

        // New work arriving releases a latched brake
        if input.remaining > self.last_remaining {
            self.braking = false;
        }
        self.last_remaining = input.remaining;

        if braking_distance(self.velocity, input.acceleration) >= input.remaining {
            self.braking = true;
        }
        let braking = self.braking || input.master_braking;

        let floor = input.floor.min(input.target);
        let delta = if input.acceleration == 0 {
            u32::MAX
        } else {
            self.take_delta(input.acceleration, input.control_hz)
        };

        if braking {
            let slowed = self.velocity.saturating_sub(delta).max(floor);
            self.velocity = slowed.min(self.velocity.max(floor));
            self.phase = RampPhase::Decelerating;
        } else if self.velocity < input.target {
            self.velocity = self.velocity.saturating_add(delta).min(input.target).max(floor);
            self.phase = RampPhase::Accelerating;
        } else if self.velocity > input.target {
            self.velocity = self.velocity.saturating_sub(delta).max(input.target);
            self.phase = RampPhase::Decelerating;
        } else {
            self.phase = RampPhase::Cruising;
        }
        self.velocity
    }
}
