//! Pin-level motion hardware
//!
//! Builds a [`MotionHardware`] implementation from plain output pins and
//! optional quadrature counters, one set per axis.

use crate::encoder::{CounterWidth, QuadratureCounter};
use crate::gpio::OutputPin;
use crate::motion::{Axis, Direction, MotionHardware, AXIS_COUNT};

/// Pins and counter belonging to one axis
pub struct AxisPins<P, C> {
    /// Step pulse line
    pub step: P,
    /// Direction line (high = reverse)
    pub dir: P,
    /// Driver enable line
    pub enable: P,
    /// Enable line is active-low (common on A4988/TMC style drivers)
    pub enable_active_low: bool,
    /// Encoder counter, if this axis has one
    pub counter: Option<C>,
}

impl<P: OutputPin, C> AxisPins<P, C> {
    /// Create axis pins with an active-low enable and no encoder
    pub fn new(step: P, dir: P, enable: P) -> Self {
        Self {
            step,
            dir,
            enable,
            enable_active_low: true,
            counter: None,
        }
    }

    /// Attach an encoder counter
    pub fn with_counter(mut self, counter: C) -> Self {
        self.counter = Some(counter);
        self
    }
}

/// [`MotionHardware`] built from three [`AxisPins`]
pub struct PinHardware<P, C> {
    axes: [AxisPins<P, C>; AXIS_COUNT],
}

impl<P: OutputPin, C: QuadratureCounter> PinHardware<P, C> {
    /// Create from per-axis pins in X, Y, Z order
    ///
    /// All drivers are disabled and step lines lowered on construction.
    pub fn new(axes: [AxisPins<P, C>; AXIS_COUNT]) -> Self {
        let mut hw = Self { axes };
        for axis in Axis::ALL {
            hw.set_step(axis, false);
            hw.set_enabled(axis, false);
        }
        hw
    }

    /// Access the pins of one axis
    pub fn axis(&self, axis: Axis) -> &AxisPins<P, C> {
        &self.axes[axis.index()]
    }

    /// Release the pins
    pub fn release(self) -> [AxisPins<P, C>; AXIS_COUNT] {
        self.axes
    }
}

impl<P: OutputPin, C: QuadratureCounter> MotionHardware for PinHardware<P, C> {
    fn set_direction(&mut self, axis: Axis, direction: Direction) {
        self.axes[axis.index()]
            .dir
            .set_level(direction == Direction::Reverse);
    }

    fn set_enabled(&mut self, axis: Axis, enabled: bool) {
        let pins = &mut self.axes[axis.index()];
        let level = enabled != pins.enable_active_low;
        pins.enable.set_level(level);
    }

    fn set_step(&mut self, axis: Axis, high: bool) {
        self.axes[axis.index()].step.set_level(high);
    }

    fn read_encoder(&mut self, axis: Axis) -> u32 {
        self.axes[axis.index()]
            .counter
            .as_mut()
            .map_or(0, |counter| counter.read_raw())
    }

    fn encoder_width(&self, axis: Axis) -> CounterWidth {
        self.axes[axis.index()]
            .counter
            .as_ref()
            .map_or(CounterWidth::default(), |counter| counter.width())
    }
}
