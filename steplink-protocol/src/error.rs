//! Protocol error kinds

use core::fmt;

/// Errors returned by codecs, the response queue and the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Empty, short or otherwise unusable input
    InvalidArgument,
    /// Header, type, length, tail or parity mismatch
    Frame,
    /// Capacity exceeded (buffer too small, frame too long)
    Range,
    /// No storage left for a new entry
    Allocation,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::InvalidArgument => "invalid argument",
            Error::Frame => "malformed frame",
            Error::Range => "capacity exceeded",
            Error::Allocation => "out of storage",
        };
        f.write_str(msg)
    }
}
