//! Quadrature encoder counter abstraction

/// Width of a hardware counter register
///
/// The engine handles wrap-around itself, so it needs to know where the
/// counter rolls over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CounterWidth {
    /// 16-bit timer in encoder mode
    Bits16,
    /// 32-bit timer in encoder mode
    #[default]
    Bits32,
}

impl CounterWidth {
    /// Signed distance from `last` to `raw`, taking the shortest path
    /// around the counter's wrap point.
    pub fn wrapping_delta(self, last: u32, raw: u32) -> i64 {
        match self {
            CounterWidth::Bits16 => (raw as u16).wrapping_sub(last as u16) as i16 as i64,
            CounterWidth::Bits32 => raw.wrapping_sub(last) as i32 as i64,
        }
    }
}

/// Raw hardware quadrature counter
pub trait QuadratureCounter {
    /// Read the raw counter register
    ///
    /// 16-bit counters return their value zero-extended.
    fn read_raw(&mut self) -> u32;

    /// Width of the counter register
    fn width(&self) -> CounterWidth;
}
