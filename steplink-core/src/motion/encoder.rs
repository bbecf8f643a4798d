//! Encoder position tracking
//!
//! Hardware counters are 16 or 32 bits wide and wrap. Each sample adds the
//! signed delta since the previous raw reading to a 64-bit position, so the
//! position never wraps in practice.

use steplink_hal::CounterWidth;

/// Tracked position of one encoder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderState {
    /// Accumulated counts since power-up
    position: i64,
    last_raw: u32,
    /// First sample taken
    latched: bool,
    /// Position at the last origin reset
    origin: i64,
    /// Absolute position at the last origin reset
    base: i64,
}

impl EncoderState {
    pub const fn new() -> Self {
        Self {
            position: 0,
            last_raw: 0,
            latched: false,
            origin: 0,
            base: 0,
        }
    }

    /// Fold a raw counter reading into the position
    ///
    /// The first sample only latches the raw value.
    pub fn sample(&mut self, raw: u32, width: CounterWidth) {
        if self.latched {
            self.position += width.wrapping_delta(self.last_raw, raw);
        }
        self.last_raw = raw;
        self.latched = true;
    }

    /// Counts accumulated since power-up
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Counts since the last origin reset
    pub fn relative(&self) -> i64 {
        self.position - self.origin
    }

    /// Absolute position reported to the host
    pub fn absolute(&self) -> i64 {
        self.base + self.relative()
    }

    /// Re-zero the relative position
    ///
    /// The absolute position is continuous across the reset.
    pub fn set_origin(&mut self) {
        self.base += self.relative();
        self.origin = self.position;
    }
}
