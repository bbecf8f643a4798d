//! Motion configuration
//!
//! Timing, ramp, controller and drive parameters for the engine. Boards
//! either build a [`MotionConfig`] in code or, with the `serde` feature,
//! load it from a postcard blob.

use core::fmt;

use steplink_hal::AXIS_COUNT;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Highest supported microstep factor
pub const MAX_MICROSTEPS: u16 = 256;

/// Position controller limits shared by all axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PidLimits {
    /// Integral accumulator clamp, in step·ticks
    pub integral_clamp: i32,
    /// Largest velocity correction, steps per second
    pub output_limit: i32,
    /// Errors this size or smaller count as zero
    pub deadband: i32,
    /// Derivative low-pass filter shift (0 = unfiltered)
    pub derivative_shift: u8,
}

impl Default for PidLimits {
    fn default() -> Self {
        Self {
            integral_clamp: 4096,
            output_limit: 2000,
            deadband: 1,
            derivative_shift: 2,
        }
    }
}

/// Speed reduction applied to axes that lead the master axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThrottleConfig {
    /// Position error in steps at which the full reduction applies
    pub error_threshold: u32,
    /// Speed fraction at the threshold, out of 256
    pub min_fraction_q8: u16,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            error_threshold: 200,
            min_fraction_q8: 64,
        }
    }
}

/// Coulomb + viscous friction transfer function
///
/// Velocities at or below `coulomb_offset` produce no motion; above it the
/// excess is attenuated by `viscous_q8 / 256`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrictionModel {
    pub coulomb_offset: u16,
    pub viscous_q8: u8,
}

impl FrictionModel {
    pub const fn new(coulomb_offset: u16, viscous_q8: u8) -> Self {
        Self {
            coulomb_offset,
            viscous_q8,
        }
    }

    /// Apply the transfer function to a velocity
    pub fn apply(&self, velocity: u32) -> u32 {
        let offset = self.coulomb_offset as u32;
        if velocity <= offset {
            return 0;
        }
        ((velocity - offset) * (256 - self.viscous_q8 as u32)) >> 8
    }

    /// [`apply`](Self::apply) for an axis with steps left
    ///
    /// A nonzero velocity never drops below `min_velocity` (or itself, if
    /// lower), so an offset above the commanded speed slows a move instead
    /// of stalling it.
    pub fn apply_running(&self, velocity: u32, min_velocity: u32) -> u32 {
        if velocity == 0 {
            return 0;
        }
        self.apply(velocity).max(min_velocity.min(velocity))
    }
}

/// Complete motion engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotionConfig {
    /// Step tick (DDA) rate in Hz
    pub step_tick_hz: u32,
    /// Control tick (ramp/PID) rate in Hz
    pub control_tick_hz: u32,
    /// Step line high time in step ticks
    pub step_pulse_ticks: u16,
    /// Minimum step line low time in step ticks
    pub step_low_ticks: u16,
    /// Hold after enabling a driver, in step ticks
    pub enable_settle_ticks: u16,
    /// Hold after a direction change, in step ticks
    pub dir_settle_ticks: u16,
    /// Ramp acceleration in steps/s²
    pub acceleration: u32,
    /// Slowest running velocity in steps/s
    pub min_velocity: u32,
    pub pid: PidLimits,
    pub throttle: ThrottleConfig,
    /// Friction model active at startup
    pub friction: Option<FrictionModel>,
    /// Motor full steps per revolution
    pub full_steps_per_rev: u16,
    /// Driver microstep factor
    pub microsteps: u16,
    /// Encoder counts per revolution per axis, 0 for open loop
    pub encoder_counts_per_rev: [u32; AXIS_COUNT],
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            step_tick_hz: 50_000,
            control_tick_hz: 1_000,
            step_pulse_ticks: 2,
            step_low_ticks: 2,
            enable_settle_ticks: 10,
            dir_settle_ticks: 2,
            acceleration: 20_000,
            min_velocity: 50,
            pid: PidLimits::default(),
            throttle: ThrottleConfig::default(),
            friction: None,
            full_steps_per_rev: 200,
            microsteps: 16,
            encoder_counts_per_rev: [4000; AXIS_COUNT],
        }
    }
}

impl MotionConfig {
    /// Check the configuration for values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step_tick_hz == 0 || self.control_tick_hz == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.step_pulse_ticks == 0 {
            return Err(ConfigError::ZeroPulseWidth);
        }
        if self.control_tick_hz > self.step_tick_hz {
            return Err(ConfigError::ControlRateAboveStepRate);
        }
        if !valid_microsteps(self.microsteps) {
            return Err(ConfigError::InvalidMicrosteps);
        }
        Ok(())
    }

    /// Highest step rate the pulse timing allows, in steps/s
    pub fn max_step_rate(&self) -> u32 {
        let period = self.step_pulse_ticks as u32 + self.step_low_ticks as u32;
        self.step_tick_hz / period.max(1)
    }

    /// Microsteps per motor revolution
    pub fn steps_per_rev(&self) -> u32 {
        self.full_steps_per_rev as u32 * self.microsteps as u32
    }

    /// Lowest velocity a decelerating axis may reach
    pub fn velocity_floor(&self, friction: Option<&FrictionModel>) -> u32 {
        self.min_velocity + friction.map_or(0, |f| f.coulomb_offset as u32)
    }

    /// Decode a configuration blob and validate it
    #[cfg(feature = "serde")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: MotionConfig =
            postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;
        config.validate()?;
        Ok(config)
    }

    /// Encode into `buf`, returning the used prefix
    #[cfg(feature = "serde")]
    pub fn to_slice<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
        postcard::to_slice(self, buf).map_err(|_| ConfigError::Serialize)
    }
}

/// Microstep factor accepted by the drivers: a power of two up to 256
pub fn valid_microsteps(microsteps: u16) -> bool {
    microsteps.is_power_of_two() && microsteps <= MAX_MICROSTEPS
}

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A tick rate is zero
    ZeroTickRate,
    /// Step pulse width is zero
    ZeroPulseWidth,
    /// Control tick faster than the step tick
    ControlRateAboveStepRate,
    /// Microsteps not a power of two in 1..=256
    InvalidMicrosteps,
    /// Blob could not be decoded
    Deserialize,
    /// Output buffer too small
    Serialize,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ConfigError::ZeroTickRate => "tick rate is zero",
            ConfigError::ZeroPulseWidth => "step pulse width is zero",
            ConfigError::ControlRateAboveStepRate => "control rate above step rate",
            ConfigError::InvalidMicrosteps => "microsteps not a power of two up to 256",
            ConfigError::Deserialize => "config blob could not be decoded",
            ConfigError::Serialize => "config buffer too small",
        };
        f.write_str(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = MotionConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.max_step_rate(), 12_500);
        assert_eq!(config.steps_per_rev(), 3200);
    }

    #[test]
    fn test_validate_rejections() {
        let mut config = MotionConfig::default();
        config.step_tick_hz = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroTickRate));

        let mut config = MotionConfig::default();
        config.step_pulse_ticks = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroPulseWidth));

        let mut config = MotionConfig::default();
        config.control_tick_hz = 100_000;
        assert_eq!(config.validate(), Err(ConfigError::ControlRateAboveStepRate));

        let mut config = MotionConfig::default();
        config.microsteps = 12;
        assert_eq!(config.validate(), Err(ConfigError::InvalidMicrosteps));
        config.microsteps = 512;
        assert_eq!(config.validate(), Err(ConfigError::InvalidMicrosteps));
    }

    #[test]
    fn test_valid_microsteps() {
        for n in [1, 2, 4, 8, 16, 32, 64, 128, 256] {
            assert!(valid_microsteps(n));
        }
        for n in [0, 3, 6, 100, 257, 1024] {
            assert!(!valid_microsteps(n));
        }
    }

    #[test]
    fn test_friction_transfer() {
        let model = FrictionModel::new(40, 64);
        assert_eq!(model.apply(0), 0);
        assert_eq!(model.apply(40), 0);
        // (140 - 40) * 192 / 256
        assert_eq!(model.apply(140), 75);
        assert_eq!(FrictionModel::new(0, 0).apply(1000), 1000);
    }

    #[test]
    fn test_friction_running_keeps_minimum() {
        let model = FrictionModel::new(120, 16);
        assert_eq!(model.apply_running(0, 50), 0);
        assert_eq!(model.apply_running(100, 50), 50);
        assert_eq!(model.apply_running(30, 50), 30);
        assert_eq!(model.apply_running(1120, 50), 937);
    }

    #[test]
    fn test_velocity_floor_includes_coulomb() {
        let config = MotionConfig::default();
        assert_eq!(config.velocity_floor(None), 50);
        assert_eq!(config.velocity_floor(Some(&FrictionModel::new(30, 0))), 80);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_postcard_blob() {
        let mut config = MotionConfig::default();
        config.friction = Some(FrictionModel::new(25, 10));
        config.encoder_counts_per_rev = [0, 4000, 1024];

        let mut buf = [0u8; 128];
        let len = config.to_slice(&mut buf).unwrap().len();
        assert_eq!(MotionConfig::from_bytes(&buf[..len]), Ok(config));
        assert_eq!(
            MotionConfig::from_bytes(&[0xFF, 0xFF]),
            Err(ConfigError::Deserialize)
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_postcard_blob_is_validated() {
        let mut config = MotionConfig::default();
        config.microsteps = 3;
        let mut buf = [0u8; 128];
        let len = config.to_slice(&mut buf).unwrap().len();
        assert_eq!(
            MotionConfig::from_bytes(&buf[..len]),
            Err(ConfigError::InvalidMicrosteps)
        );
    }
}
