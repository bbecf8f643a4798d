//! Board peripherals outside the motion path
//!
//! LEDs, the homing sequence and the probe are board-specific. The request
//! services reach them through [`AuxServices`]; boards without them use
//! [`NoAux`].

use steplink_protocol::messages::LedMode;

use crate::error::AuxError;

/// Auxiliary peripherals reachable from host requests
pub trait AuxServices {
    /// Drive an indicator LED
    fn set_led(&mut self, led: u8, mode: LedMode) -> Result<(), AuxError>;

    /// Begin homing the axes in `axis_mask`
    ///
    /// Returns once the sequence is started; completion is not reported.
    fn start_homing(&mut self, axis_mask: u8, dir_mask: u8, velocity: u16)
        -> Result<(), AuxError>;

    /// Sample the probe input
    fn probe_level(&mut self) -> Result<u16, AuxError>;
}

/// Board without auxiliary peripherals
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAux;

impl AuxServices for NoAux {
    fn set_led(&mut self, _led: u8, _mode: LedMode) -> Result<(), AuxError> {
        Err(AuxError::Unsupported)
    }

    fn start_homing(
        &mut self,
        _axis_mask: u8,
        _dir_mask: u8,
        _velocity: u16,
    ) -> Result<(), AuxError> {
        Err(AuxError::Unsupported)
    }

    fn probe_level(&mut self) -> Result<u16, AuxError> {
        Err(AuxError::Unsupported)
    }
}

impl<T: AuxServices + ?Sized> AuxServices for &mut T {
    fn set_led(&mut self, led: u8, mode: LedMode) -> Result<(), AuxError> {
        (**self).set_led(led, mode)
    }

    fn start_homing(
        &mut self,
        axis_mask: u8,
        dir_mask: u8,
        velocity: u16,
    ) -> Result<(), AuxError> {
        (**self).start_homing(axis_mask, dir_mask, velocity)
    }

    fn probe_level(&mut self) -> Result<u16, AuxError> {
        (**self).probe_level()
    }
}
