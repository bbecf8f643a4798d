//! Steplink Hardware Abstraction Layer
//!
//! This crate defines the hardware capabilities the motion engine needs.
//! Board crates implement them on top of their chip HAL; the engine only
//! ever talks to [`MotionHardware`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  steplink-core (motion engine)          │
//! └─────────────────────────────────────────┘
//!                     │  MotionHardware
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  steplink-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │  OutputPin / QuadratureCounter
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  board crate (timers, GPIO, counters)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Digital output (step, direction, enable lines)
//! - [`encoder::QuadratureCounter`] - Raw hardware encoder counter
//! - [`motion::MotionHardware`] - The per-axis capability used by the engine
//!
//! [`pins::PinHardware`] adapts three sets of pins and counters into a
//! [`MotionHardware`] implementation.

#![no_std]
#![deny(unsafe_code)]

pub mod encoder;
pub mod gpio;
pub mod motion;
pub mod pins;

// Re-export key traits at crate root for convenience
pub use encoder::{CounterWidth, QuadratureCounter};
pub use gpio::OutputPin;
pub use motion::{Axis, Direction, MotionHardware, AXIS_COUNT};
pub use pins::{AxisPins, PinHardware};
