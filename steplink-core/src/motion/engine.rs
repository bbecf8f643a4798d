//! Motion engine
//!
//! Owns the move queue, the per-axis state and the hardware. Two interrupt
//! entry points drive it:
//!
//! - [`MotionEngine::tick_step`] at the step rate (50 kHz by default) closes
//!   step pulses, runs the DDA and chains segments
//! - [`MotionEngine::tick_control`] at the control rate (1 kHz by default)
//!   samples encoders and recomputes each axis velocity
//!
//! Request handlers call the remaining methods from the poll loop, under the
//! same critical section as the ticks.

use steplink_hal::{Axis, Direction, MotionHardware, AXIS_COUNT};
use steplink_protocol::messages::MoveEndReason;

use super::axis::AxisState;
use super::encoder::EncoderState;
use super::pid::PositionPid;
use super::queue::{MoveQueue, MoveSegment, MOVE_QUEUE_DEPTH};
use super::ramp::{braking_distance, RampInput};
use super::state::{MotionState, Trigger};
use crate::config::{valid_microsteps, ConfigError, FrictionModel, MotionConfig};
use crate::error::MotionError;
use crate::fixed::{clamp_i8, scale_q8, Phase, Q8_ONE};

/// Something the host should hear about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionEvent {
    /// The last queued segment finished
    MoveCompleted { frame_id: u8 },
}

/// Snapshot reported by the status request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionStatus {
    pub state: MotionState,
    /// Queued segments, clamped to a byte
    pub queue_depth: u8,
    /// Active segment completion per axis, 0..=100
    pub completion: [u8; AXIS_COUNT],
    /// Last position error per axis in steps, clamped
    pub position_error: [i8; AXIS_COUNT],
}

/// Motion engine for three axes
pub struct MotionEngine<H, const Q: usize = MOVE_QUEUE_DEPTH> {
    hw: H,
    config: MotionConfig,
    queue: MoveQueue<Q>,
    axes: [AxisState; AXIS_COUNT],
    encoders: [EncoderState; AXIS_COUNT],
    pid: [PositionPid; AXIS_COUNT],
    /// Last following error per axis, steps
    errors: [i64; AXIS_COUNT],
    state: MotionState,
    /// Frame id of the active segment
    active: Option<u8>,
    master: Option<Axis>,
    friction: Option<FrictionModel>,
}

impl<H: MotionHardware, const Q: usize> MotionEngine<H, Q> {
    /// Create an engine with all drivers disabled
    pub fn new(mut hw: H, config: MotionConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        for axis in Axis::ALL {
            hw.set_step(axis, false);
            hw.set_enabled(axis, false);
            hw.set_direction(axis, Direction::Forward);
        }

        info!(
            "motion engine: step {} Hz, control {} Hz, max rate {} steps/s",
            config.step_tick_hz,
            config.control_tick_hz,
            config.max_step_rate()
        );

        Ok(Self {
            hw,
            friction: config.friction,
            config,
            queue: MoveQueue::new(),
            axes: Default::default(),
            encoders: [EncoderState::new(); AXIS_COUNT],
            pid: [PositionPid::new(); AXIS_COUNT],
            errors: [0; AXIS_COUNT],
            state: MotionState::Idle,
            active: None,
            master: None,
        })
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn axis(&self, axis: Axis) -> &AxisState {
        &self.axes[axis.index()]
    }

    /// Axis chosen as master at the last control tick
    pub fn master(&self) -> Option<Axis> {
        self.master
    }

    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    /// Steps left on `axis`: active segment plus queue
    pub fn remaining_steps(&self, axis: Axis) -> u64 {
        self.axes[axis.index()].remaining() as u64 + self.queue.remaining(axis)
    }

    pub fn friction(&self) -> Option<FrictionModel> {
        self.friction
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    /// Queue a segment
    ///
    /// Returns the queue depth after the push.
    pub fn enqueue(&mut self, segment: MoveSegment) -> Result<usize, MotionError> {
        if matches!(self.state, MotionState::Stopping | MotionState::Error) {
            return Err(MotionError::Busy);
        }
        segment.validate()?;
        self.queue.push(segment)?;
        self.state = self.state.transition(Trigger::Enqueued);
        debug!("queued segment {}, depth {}", segment.frame_id, self.queue.len());
        Ok(self.queue.len())
    }

    /// Start or resume execution
    pub fn start(&mut self) -> Result<(), MotionError> {
        match self.state {
            MotionState::Running => return Ok(()),
            MotionState::Stopping | MotionState::Error => return Err(MotionError::Busy),
            _ => {}
        }

        if self.active.is_none() {
            let segment = self.queue.pop().ok_or(MotionError::NothingQueued)?;
            self.begin_segment(&segment, false);
        }
        self.state = self.state.transition(Trigger::Started);
        info!("motion started");
        Ok(())
    }

    /// Suspend step generation, keeping the active segment
    pub fn pause(&mut self) -> Result<(), MotionError> {
        if self.state != MotionState::Running {
            return Err(MotionError::Busy);
        }
        for axis in Axis::ALL {
            let state = &mut self.axes[axis.index()];
            state.ramp.stop();
            state.output_velocity = 0;
            state.phase_increment = Phase::ZERO;
        }
        self.state = self.state.transition(Trigger::Pause);
        Ok(())
    }

    /// Stop all axes and flush the queue, keeping drivers enabled
    pub fn end_move(&mut self) -> MoveEndReason {
        self.end_move_then(|_, _| {})
    }

    /// [`end_move`](Self::end_move), calling `notify` while still `Stopping`
    ///
    /// `notify` sees the halted engine before it returns to `Idle`.
    pub fn end_move_then<F>(&mut self, notify: F) -> MoveEndReason
    where
        F: FnOnce(&Self, MoveEndReason),
    {
        self.stop_then(false, MoveEndReason::Stopped, notify);
        info!("move ended");
        MoveEndReason::Stopped
    }

    /// Stop immediately and disable every driver
    ///
    /// Safe to call from interrupt context. Drivers are disabled and step
    /// lines lowered before this returns.
    pub fn emergency_stop(&mut self) -> MoveEndReason {
        self.emergency_stop_then(|_, _| {})
    }

    /// [`emergency_stop`](Self::emergency_stop), calling `notify` while
    /// still `Stopping`
    pub fn emergency_stop_then<F>(&mut self, notify: F) -> MoveEndReason
    where
        F: FnOnce(&Self, MoveEndReason),
    {
        self.stop_then(true, MoveEndReason::EmergencyStop, notify);
        warn!("emergency stop");
        MoveEndReason::EmergencyStop
    }

    /// Stop, notify, then settle in `Idle`
    fn stop_then<F>(&mut self, disable: bool, reason: MoveEndReason, notify: F)
    where
        F: FnOnce(&Self, MoveEndReason),
    {
        self.state = self.state.transition(Trigger::StopRequested);
        self.halt(disable);
        notify(self, reason);
        self.state = self.state.transition(Trigger::Stopped);
    }

    /// Latch a fault: drivers off, queue flushed, state `Error`
    ///
    /// Only a move end or emergency stop leaves the fault state.
    pub fn fault(&mut self) {
        self.halt(true);
        self.state = self.state.transition(Trigger::Fault);
        error!("motion fault latched");
    }

    /// Frame id of the active segment
    pub fn active_frame_id(&self) -> Option<u8> {
        self.active
    }

    fn halt(&mut self, disable: bool) {
        for axis in Axis::ALL {
            self.hw.set_step(axis, false);
            if disable {
                self.hw.set_enabled(axis, false);
            }
            let state = &mut self.axes[axis.index()];
            state.stop();
            state.enable_settle = 0;
            state.dir_settle = 0;
            if disable {
                state.enabled = false;
            }
            self.pid[axis.index()].reset();
        }
        self.queue.clear();
        self.errors = [0; AXIS_COUNT];
        self.active = None;
        self.master = None;
    }

    /// Load a segment into the axes
    ///
    /// `chaining` keeps the ramp velocity of a running engine.
    fn begin_segment(&mut self, segment: &MoveSegment, chaining: bool) {
        let max_rate = self.config.max_step_rate();
        for axis in Axis::ALL {
            let i = axis.index();
            let state = &mut self.axes[i];
            let steps = segment.steps[i];
            let velocity = (segment.velocity[i] as u32).min(max_rate);

            state.load(steps, velocity, segment.gains[i]);

            let direction = Direction::from_mask(segment.dir_mask, axis);
            if steps > 0 && direction != state.direction {
                self.hw.set_direction(axis, direction);
                state.direction = direction;
                state.dir_settle = self.config.dir_settle_ticks;
            }

            if steps > 0 && !state.enabled {
                self.hw.set_enabled(axis, true);
                state.enabled = true;
                state.enable_settle = self.config.enable_settle_ticks;
            }

            if !chaining {
                state.ramp.stop();
                state.output_velocity = 0;
                state.phase_increment = Phase::ZERO;
                self.pid[i].reset();
            }
        }
        self.active = Some(segment.frame_id);
        debug!("segment {} begins", segment.frame_id);
    }

    fn segment_complete(&self) -> bool {
        self.axes.iter().all(|a| a.is_complete())
    }

    fn any_pulse_high(&self) -> bool {
        self.axes.iter().any(|a| a.is_pulse_high())
    }

    /// High-rate tick: pulse timing, DDA, segment chaining
    pub fn tick_step(&mut self) -> Option<MotionEvent> {
        let low_ticks = self.config.step_low_ticks;
        for axis in Axis::ALL {
            if self.axes[axis.index()].close_pulse(low_ticks) {
                self.hw.set_step(axis, false);
            }
        }

        if !self.state.steps_allowed() {
            return None;
        }

        let pulse_ticks = self.config.step_pulse_ticks;
        for axis in Axis::ALL {
            if self.axes[axis.index()].accumulate(pulse_ticks) {
                self.hw.set_step(axis, true);
            }
        }

        if !self.segment_complete() || self.any_pulse_high() {
            return None;
        }

        if self.queue.has_outstanding_steps() {
            if let Some(next) = self.queue.pop() {
                self.begin_segment(&next, true);
            }
            return None;
        }

        let frame_id = self.active.unwrap_or(0);
        self.queue.clear();
        for state in self.axes.iter_mut() {
            state.stop();
        }
        self.active = None;
        self.master = None;
        self.state = self.state.transition(Trigger::Exhausted);
        info!("move {} completed", frame_id);
        Some(MotionEvent::MoveCompleted { frame_id })
    }

    /// Pick the axis the others pace themselves against
    ///
    /// The axis with the lowest progress among those with steps left in the
    /// active segment, or failing that the one with the most queued work.
    fn select_master(&self) -> Option<Axis> {
        let mut best: Option<Axis> = None;
        for axis in Axis::ALL {
            let state = &self.axes[axis.index()];
            if state.is_complete() {
                continue;
            }
            best = match best {
                None => Some(axis),
                Some(current) => {
                    let b = &self.axes[current.index()];
                    // emitted/total < b.emitted/b.total without division
                    let lhs = state.emitted_steps as u64 * b.total_steps as u64;
                    let rhs = b.emitted_steps as u64 * state.total_steps as u64;
                    if lhs < rhs {
                        Some(axis)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        if best.is_some() {
            return best;
        }

        Axis::ALL
            .into_iter()
            .filter(|&axis| self.remaining_steps(axis) > 0)
            .max_by_key(|&axis| self.remaining_steps(axis))
    }

    /// Following error of `axis` in steps, positive when lagging
    ///
    /// `None` for open-loop axes.
    fn following_error(&self, axis: Axis) -> Option<i64> {
        let i = axis.index();
        let counts_per_rev = self.config.encoder_counts_per_rev[i] as i64;
        if counts_per_rev == 0 {
            return None;
        }
        let steps_per_rev = self.config.steps_per_rev() as i64;
        let measured = self.encoders[i].relative() * steps_per_rev / counts_per_rev;
        let state = &self.axes[i];
        Some((state.commanded_position - measured) * state.direction.sign())
    }

    /// Low-rate tick: encoders, master selection, ramp, correction
    pub fn tick_control(&mut self) {
        for axis in Axis::ALL {
            let raw = self.hw.read_encoder(axis);
            let width = self.hw.encoder_width(axis);
            self.encoders[axis.index()].sample(raw, width);
        }

        if self.state != MotionState::Running {
            return;
        }

        self.master = self.select_master();

        // The master ramps first so the others can follow its brake
        let mut order = Axis::ALL;
        if let Some(master) = self.master {
            order.swap(0, master.index());
        }

        let max_rate = self.config.max_step_rate();
        let floor = self.config.velocity_floor(self.friction.as_ref());
        let mut master_braking = false;

        for axis in order {
            let i = axis.index();
            let is_master = self.master == Some(axis);
            let remaining = self.remaining_steps(axis);
            let error = self.following_error(axis);

            let state = &mut self.axes[i];
            if state.is_complete() {
                state.ramp.stop();
                state.output_velocity = 0;
                state.phase_increment = Phase::ZERO;
                continue;
            }

            let mut velocity = state.ramp.update(RampInput {
                target: state.commanded_velocity,
                remaining,
                master_braking: master_braking && !is_master,
                acceleration: self.config.acceleration,
                control_hz: self.config.control_tick_hz,
                floor,
            });
            if is_master {
                master_braking = state.ramp.is_braking();
            }

            if let Some(error) = error {
                self.errors[i] = error;
                let correction = self.pid[i].update(error, state.gains, &self.config.pid);
                velocity = (velocity as i64 + correction).clamp(0, max_rate as i64) as u32;

                if !is_master {
                    velocity = scale_q8(velocity, self.throttle_fraction(error));
                }
            }

            if let Some(friction) = &self.friction {
                velocity = friction.apply_running(velocity, self.config.min_velocity);
            }

            let velocity = velocity.min(max_rate);
            let state = &mut self.axes[i];
            state.output_velocity = velocity;
            state.phase_increment = Phase::increment_for(velocity, self.config.step_tick_hz);
        }
    }

    /// Speed fraction (Q8) for a non-master axis with following error `error`
    fn throttle_fraction(&self, error: i64) -> u32 {
        let throttle = &self.config.throttle;
        let threshold = throttle.error_threshold as u64;
        if threshold == 0 {
            return Q8_ONE;
        }
        let magnitude = error.unsigned_abs().min(threshold);
        let span = Q8_ONE.saturating_sub(throttle.min_fraction_q8 as u32) as u64;
        Q8_ONE - (span * magnitude / threshold) as u32
    }

    /// Status snapshot for the host
    pub fn status(&self) -> MotionStatus {
        let mut status = MotionStatus {
            state: self.state,
            queue_depth: self.queue.len().min(u8::MAX as usize) as u8,
            ..Default::default()
        };
        for axis in Axis::ALL {
            let i = axis.index();
            status.completion[i] = self.axes[i].completion_percent();
            status.position_error[i] = clamp_i8(self.errors[i]);
        }
        status
    }

    /// Re-zero the relative position of every axis in `axis_mask`
    pub fn set_origin(&mut self, axis_mask: u8) -> Result<(), MotionError> {
        if axis_mask & 0x07 == 0 {
            return Err(MotionError::InvalidArgument);
        }
        for axis in Axis::ALL {
            if axis_mask & axis.mask() == 0 {
                continue;
            }
            let i = axis.index();
            self.encoders[i].set_origin();
            self.axes[i].commanded_position = 0;
            self.errors[i] = 0;
            self.pid[i].reset();
        }
        Ok(())
    }

    /// Absolute encoder positions in counts
    pub fn absolute_positions(&self) -> [i64; AXIS_COUNT] {
        [
            self.encoders[0].absolute(),
            self.encoders[1].absolute(),
            self.encoders[2].absolute(),
        ]
    }

    /// Change the microstep factor used for encoder scaling
    pub fn set_microsteps(&mut self, microsteps: u16) -> Result<(), MotionError> {
        if self.state.is_moving() {
            return Err(MotionError::Busy);
        }
        if !valid_microsteps(microsteps) {
            return Err(MotionError::InvalidArgument);
        }
        self.config.microsteps = microsteps;
        info!("microsteps set to {}", microsteps);
        Ok(())
    }

    /// Steps `axis` needs to stop from its current ramp velocity
    pub fn braking_distance(&self, axis: Axis) -> u64 {
        braking_distance(
            self.axes[axis.index()].ramp.velocity(),
            self.config.acceleration,
        )
    }

    /// Enable (`Some`) or disable (`None`) the friction model
    pub fn set_friction(&mut self, friction: Option<FrictionModel>) {
        self.friction = friction;
    }
}
