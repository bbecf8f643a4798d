//! Fixed-point helpers for step generation and control
//!
//! The step generator uses a Q16.16 phase accumulator. Controller gains are
//! integers with an implied scale of 2⁻⁸. No floating point is used anywhere
//! in the engine.

/// Fractional bits of the phase accumulator
pub const PHASE_FRAC_BITS: u32 = 16;

/// Controller gain scale shift (gain 256 = 1.0)
pub const GAIN_SHIFT: u32 = 8;

/// One whole unit in Q8
pub const Q8_ONE: u32 = 1 << GAIN_SHIFT;

/// Q16.16 DDA phase
///
/// Each step tick adds an increment. Crossing [`Phase::ONE`] emits one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Phase(pub u32);

impl Phase {
    pub const ZERO: Self = Self(0);

    /// One step
    pub const ONE: Self = Self(1 << PHASE_FRAC_BITS);

    /// Per-tick increment for `velocity` steps/s at `tick_hz`
    ///
    /// Capped at one step per tick. Returns zero for a zero tick rate.
    ///
    /// # Example
    /// ```
    /// use steplink_core::fixed::Phase;
    /// // 25 kHz at a 50 kHz tick is half a step per tick
    /// assert_eq!(Phase::increment_for(25_000, 50_000), Phase(1 << 15));
    /// ```
    pub fn increment_for(velocity: u32, tick_hz: u32) -> Self {
        if tick_hz == 0 {
            return Self::ZERO;
        }
        let inc = ((velocity as u64) << PHASE_FRAC_BITS) / tick_hz as u64;
        Self(inc.min(Self::ONE.0 as u64) as u32)
    }

    /// Add `increment`; returns `true` and wraps when a whole step is due
    #[inline]
    pub fn advance(&mut self, increment: Phase) -> bool {
        self.0 = self.0.saturating_add(increment.0);
        if self.0 >= Self::ONE.0 {
            self.0 -= Self::ONE.0;
            true
        } else {
            false
        }
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

/// Multiply by a Q8 gain
#[inline]
pub fn mul_gain(value: i64, gain: u16) -> i64 {
    (value * gain as i64) >> GAIN_SHIFT
}

/// Scale an unsigned value by a Q8 fraction
#[inline]
pub fn scale_q8(value: u32, fraction_q8: u32) -> u32 {
    ((value as u64 * fraction_q8 as u64) >> GAIN_SHIFT) as u32
}

/// Clamp an i64 into the i8 range
#[inline]
pub fn clamp_i8(value: i64) -> i8 {
    value.clamp(i8::MIN as i64, i8::MAX as i64) as i8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_increment_for() {
        assert_eq!(Phase::increment_for(0, 50_000), Phase::ZERO);
        assert_eq!(Phase::increment_for(50_000, 50_000), Phase::ONE);
        // Faster than the tick rate is capped
        assert_eq!(Phase::increment_for(80_000, 50_000), Phase::ONE);
        assert_eq!(Phase::increment_for(100, 0), Phase::ZERO);
        // 100 steps/s at 50 kHz: 100 * 65536 / 50000 = 131
        assert_eq!(Phase::increment_for(100, 50_000), Phase(131));
    }

    #[test]
    fn test_advance_emits_on_crossing() {
        let mut phase = Phase::ZERO;
        let half = Phase(1 << 15);
        assert!(!phase.advance(half));
        assert!(phase.advance(half));
        assert!(phase.is_zero());
    }

    #[test]
    fn test_mul_gain() {
        assert_eq!(mul_gain(100, 256), 100);
        assert_eq!(mul_gain(100, 128), 50);
        assert_eq!(mul_gain(-100, 128), -50);
        assert_eq!(mul_gain(3, 1), 0);
    }

    #[test]
    fn test_scale_q8_and_clamp() {
        assert_eq!(scale_q8(1000, 64), 250);
        assert_eq!(scale_q8(1000, 256), 1000);
        assert_eq!(clamp_i8(500), 127);
        assert_eq!(clamp_i8(-500), -128);
        assert_eq!(clamp_i8(-5), -5);
    }

    proptest! {
        #[test]
        fn prop_step_count_matches_rate(velocity in 1u32..12_500, ticks in 1u32..20_000) {
            let inc = Phase::increment_for(velocity, 50_000);
            let mut phase = Phase::ZERO;
            let mut steps = 0u64;
            for _ in 0..ticks {
                if phase.advance(inc) {
                    steps += 1;
                }
            }
            // Steps emitted equal the accumulated phase divided by one
            prop_assert_eq!(steps, (inc.0 as u64 * ticks as u64) >> PHASE_FRAC_BITS);
        }
    }
}
