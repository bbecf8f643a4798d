//! Board-agnostic core of the Steplink motion controller
//!
//! This crate holds everything between the SPI protocol and the pins:
//!
//! - Motion engine: move queue, per-axis DDA step generation, trapezoidal
//!   ramps, encoder tracking, position PID and friction model
//! - Motion state machine
//! - Motion configuration
//! - Interrupt-safe sharing of engine and response queue
//! - Request services that turn decoded frames into engine calls and
//!   responses
//!
//! The engine talks to hardware only through
//! [`steplink_hal::MotionHardware`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to every module
mod fmt;

pub mod config;
pub mod error;
pub mod fixed;
pub mod motion;
pub mod service;
pub mod shared;
pub mod traits;

pub use config::{ConfigError, FrictionModel, MotionConfig, PidLimits, ThrottleConfig};
pub use error::{AuxError, MotionError};
pub use motion::{MotionEngine, MotionEvent, MotionState, MotionStatus, MoveSegment};
pub use service::Services;
pub use shared::{shared, with_critical_section, with_shared, Shared};
pub use traits::{AuxServices, NoAux};
