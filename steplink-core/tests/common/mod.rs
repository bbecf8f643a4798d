//! Shared fixtures for the engine integration tests

#![allow(dead_code)]

use steplink_core::{MotionConfig, MotionEngine, MoveSegment};
use steplink_hal::{Axis, CounterWidth, Direction, MotionHardware, AXIS_COUNT};
use steplink_protocol::messages::PidGains;

/// Simulated drivers and encoders
///
/// Every rising step edge moves the simulated shaft one step in the
/// current direction. The encoder reports the shaft position scaled to
/// `counts_per_rev` unless the axis is marked stalled.
#[derive(Debug)]
pub struct SimHardware {
    pub direction: [Direction; AXIS_COUNT],
    pub enabled: [bool; AXIS_COUNT],
    pub step: [bool; AXIS_COUNT],
    /// Shaft position in steps
    pub position: [i64; AXIS_COUNT],
    pub rising_edges: [u32; AXIS_COUNT],
    /// Edges seen while the driver was disabled
    pub edges_while_disabled: u32,
    pub steps_per_rev: i64,
    pub counts_per_rev: [i64; AXIS_COUNT],
    /// Encoder frozen at its last value
    pub stalled: [bool; AXIS_COUNT],
    pub width: CounterWidth,
    encoder: [u32; AXIS_COUNT],
}

impl SimHardware {
    pub fn new(config: &MotionConfig) -> Self {
        Self {
            direction: [Direction::Forward; AXIS_COUNT],
            enabled: [false; AXIS_COUNT],
            step: [false; AXIS_COUNT],
            position: [0; AXIS_COUNT],
            rising_edges: [0; AXIS_COUNT],
            edges_while_disabled: 0,
            steps_per_rev: config.steps_per_rev() as i64,
            counts_per_rev: config.encoder_counts_per_rev.map(|c| c as i64),
            stalled: [false; AXIS_COUNT],
            width: CounterWidth::Bits32,
            encoder: [0; AXIS_COUNT],
        }
    }
}

impl MotionHardware for SimHardware {
    fn set_direction(&mut self, axis: Axis, direction: Direction) {
        self.direction[axis.index()] = direction;
    }

    fn set_enabled(&mut self, axis: Axis, enabled: bool) {
        self.enabled[axis.index()] = enabled;
    }

    fn set_step(&mut self, axis: Axis, high: bool) {
        let i = axis.index();
        if high && !self.step[i] {
            self.rising_edges[i] += 1;
            if !self.enabled[i] {
                self.edges_while_disabled += 1;
            }
            self.position[i] += self.direction[i].sign();
        }
        self.step[i] = high;
    }

    fn read_encoder(&mut self, axis: Axis) -> u32 {
        let i = axis.index();
        if !self.stalled[i] && self.counts_per_rev[i] > 0 {
            let counts = self.position[i] * self.counts_per_rev[i] / self.steps_per_rev;
            self.encoder[i] = counts as u32;
        }
        match self.width {
            CounterWidth::Bits16 => self.encoder[i] & 0xFFFF,
            CounterWidth::Bits32 => self.encoder[i],
        }
    }

    fn encoder_width(&self, _axis: Axis) -> CounterWidth {
        self.width
    }
}

pub type Engine = MotionEngine<SimHardware, 32>;

pub fn open_loop_config() -> MotionConfig {
    MotionConfig {
        encoder_counts_per_rev: [0; AXIS_COUNT],
        ..Default::default()
    }
}

pub fn engine(config: MotionConfig) -> Engine {
    let hw = SimHardware::new(&config);
    MotionEngine::new(hw, config).expect("valid config")
}

pub fn segment(frame_id: u8, dir_mask: u8, steps: [u32; 3], velocity: [u16; 3]) -> MoveSegment {
    MoveSegment {
        frame_id,
        dir_mask,
        steps,
        velocity,
        gains: [PidGains::new(256, 4, 64); AXIS_COUNT],
    }
}

/// Step ticks per control tick
pub fn control_ratio(engine: &Engine) -> u32 {
    engine.config().step_tick_hz / engine.config().control_tick_hz
}
