//! Slave-side transmit buffer priming
//!
//! Before each transfer the slave fills its transmit buffer with a status
//! byte. When a response is waiting, the buffer becomes the response
//! followed by READY padding.

use crate::wire::{STATUS_BUSY, STATUS_READY};

/// What [`prime`] left in the transmit buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PrimeOutcome {
    /// READY padding only
    Ready,
    /// BUSY padding only
    Busy,
    /// Response copied to the front, READY padding after it
    ResponseInjected,
    /// Unknown status byte, or a response that does not fit
    Unrecognized,
}

impl PrimeOutcome {
    /// Whether the pending response was placed on the wire
    pub fn consumed(self) -> bool {
        self == PrimeOutcome::ResponseInjected
    }
}

/// Status byte for a receive queue holding `count` of `capacity` frames
pub fn status_for_occupancy(count: usize, capacity: usize) -> u8 {
    if count >= capacity {
        STATUS_BUSY
    } else {
        STATUS_READY
    }
}

/// Fill `tx` for the next transfer
///
/// The buffer is padded with `status`. A non-empty `response` that fits is
/// copied to the front of a READY-padded buffer. An unknown `status` leaves
/// the response out.
pub fn prime(status: u8, response: Option<&[u8]>, tx: &mut [u8]) -> PrimeOutcome {
    tx.fill(status);

    let plain = match status {
        STATUS_READY => PrimeOutcome::Ready,
        STATUS_BUSY => PrimeOutcome::Busy,
        _ => return PrimeOutcome::Unrecognized,
    };

    match response {
        Some(frame) if !frame.is_empty() && frame.len() <= tx.len() => {
            tx.fill(STATUS_READY);
            tx[..frame.len()].copy_from_slice(frame);
            PrimeOutcome::ResponseInjected
        }
        Some(_) => PrimeOutcome::Unrecognized,
        None => plain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::TRANSFER_SIZE;

    #[test]
    fn test_ready_without_response() {
        let mut tx = [0u8; TRANSFER_SIZE];
        assert_eq!(prime(STATUS_READY, None, &mut tx), PrimeOutcome::Ready);
        assert!(tx.iter().all(|&b| b == STATUS_READY));
    }

    #[test]
    fn test_busy_without_response() {
        let mut tx = [0u8; TRANSFER_SIZE];
        assert_eq!(prime(STATUS_BUSY, None, &mut tx), PrimeOutcome::Busy);
        assert!(tx.iter().all(|&b| b == STATUS_BUSY));
    }

    #[test]
    fn test_busy_with_fitting_response_pads_ready() {
        let mut tx = [0u8; TRANSFER_SIZE];
        let response = [0xB6, 0x03, 0x01, 0x00, 0x02, 0x6B];
        let outcome = prime(STATUS_BUSY, Some(&response), &mut tx);
        assert_eq!(outcome, PrimeOutcome::ResponseInjected);
        assert!(outcome.consumed());
        assert_eq!(&tx[..6], &response);
        assert!(tx[6..].iter().all(|&b| b == STATUS_READY));
    }

    #[test]
    fn test_oversized_response_not_injected() {
        let mut tx = [0u8; 8];
        let response = [0xAA; 9];
        let outcome = prime(STATUS_READY, Some(&response), &mut tx);
        assert_eq!(outcome, PrimeOutcome::Unrecognized);
        assert!(!outcome.consumed());
        assert!(tx.iter().all(|&b| b == STATUS_READY));
    }

    #[test]
    fn test_empty_response_not_injected() {
        let mut tx = [0u8; 8];
        assert_eq!(
            prime(STATUS_BUSY, Some(&[]), &mut tx),
            PrimeOutcome::Unrecognized
        );
        assert!(tx.iter().all(|&b| b == STATUS_BUSY));
    }

    #[test]
    fn test_unknown_status_keeps_response_out() {
        let mut tx = [0u8; 8];
        let outcome = prime(0x00, Some(&[0xB6, 0x6B]), &mut tx);
        assert_eq!(outcome, PrimeOutcome::Unrecognized);
        assert_eq!(tx, [0u8; 8]);
    }

    #[test]
    fn test_status_for_occupancy() {
        assert_eq!(status_for_occupancy(0, 4), STATUS_READY);
        assert_eq!(status_for_occupancy(3, 4), STATUS_READY);
        assert_eq!(status_for_occupancy(4, 4), STATUS_BUSY);
        assert_eq!(status_for_occupancy(5, 4), STATUS_BUSY);
    }
}
