//! Move segment queue
//!
//! A bounded FIFO of segments with a running per-axis sum of queued steps.
//! The sums let the ramp planner and the completion check see the total
//! outstanding work in O(1).

use heapless::Deque;
use steplink_hal::{Axis, AXIS_COUNT};
use steplink_protocol::messages::{MoveQueueAdd, PidGains};

use crate::error::MotionError;

/// Default move queue capacity
pub const MOVE_QUEUE_DEPTH: usize = 256;

/// One queued move, consumed exactly once by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveSegment {
    /// Frame id of the request that queued this segment
    pub frame_id: u8,
    /// Bit n set: axis n travels in reverse
    pub dir_mask: u8,
    pub steps: [u32; AXIS_COUNT],
    /// Commanded velocity per axis, steps/s
    pub velocity: [u16; AXIS_COUNT],
    pub gains: [PidGains; AXIS_COUNT],
}

impl MoveSegment {
    /// Check that the segment moves at least one axis and every moving
    /// axis has a nonzero velocity
    pub fn validate(&self) -> Result<(), MotionError> {
        if self.steps.iter().all(|&s| s == 0) {
            return Err(MotionError::InvalidArgument);
        }
        let stalled = self
            .steps
            .iter()
            .zip(self.velocity.iter())
            .any(|(&steps, &velocity)| steps > 0 && velocity == 0);
        if stalled {
            return Err(MotionError::InvalidArgument);
        }
        Ok(())
    }
}

impl From<&MoveQueueAdd> for MoveSegment {
    fn from(msg: &MoveQueueAdd) -> Self {
        Self {
            frame_id: msg.frame_id,
            dir_mask: msg.dir_mask,
            steps: msg.steps,
            velocity: msg.velocity,
            gains: msg.gains,
        }
    }
}

/// FIFO of move segments
#[derive(Debug)]
pub struct MoveQueue<const N: usize = MOVE_QUEUE_DEPTH> {
    segments: Deque<MoveSegment, N>,
    /// Sum of queued steps per axis
    remaining: [u64; AXIS_COUNT],
}

impl<const N: usize> Default for MoveQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MoveQueue<N> {
    pub const fn new() -> Self {
        Self {
            segments: Deque::new(),
            remaining: [0; AXIS_COUNT],
        }
    }

    pub fn push(&mut self, segment: MoveSegment) -> Result<(), MotionError> {
        self.segments
            .push_back(segment)
            .map_err(|_| MotionError::QueueFull)?;
        for (sum, &steps) in self.remaining.iter_mut().zip(segment.steps.iter()) {
            *sum += steps as u64;
        }
        Ok(())
    }

    pub fn pop(&mut self) -> Option<MoveSegment> {
        let segment = self.segments.pop_front()?;
        for (sum, &steps) in self.remaining.iter_mut().zip(segment.steps.iter()) {
            *sum -= steps as u64;
        }
        Some(segment)
    }

    pub fn clear(&mut self) {
        self.segments.clear();
        self.remaining = [0; AXIS_COUNT];
    }

    /// Queued steps on `axis`, not counting the active segment
    pub fn remaining(&self, axis: Axis) -> u64 {
        self.remaining[axis.index()]
    }

    /// Whether any queued segment still has steps to emit
    pub fn has_outstanding_steps(&self) -> bool {
        self.remaining.iter().any(|&r| r > 0)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.segments.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn iter(&self) -> impl Iterator<Item = &MoveSegment> {
        self.segments.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn segment(x: u32, y: u32, z: u32) -> MoveSegment {
        MoveSegment {
            steps: [x, y, z],
            velocity: [1000; AXIS_COUNT],
            ..Default::default()
        }
    }

    #[test]
    fn test_remaining_tracks_push_pop() {
        let mut queue: MoveQueue<4> = MoveQueue::new();
        queue.push(segment(10, 0, 5)).unwrap();
        queue.push(segment(1, 2, 3)).unwrap();
        assert_eq!(queue.remaining(Axis::X), 11);
        assert_eq!(queue.remaining(Axis::Y), 2);
        assert_eq!(queue.remaining(Axis::Z), 8);

        assert_eq!(queue.pop().unwrap().steps, [10, 0, 5]);
        assert_eq!(queue.remaining(Axis::X), 1);
        assert_eq!(queue.remaining(Axis::Z), 3);

        queue.pop().unwrap();
        assert!(!queue.has_outstanding_steps());
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_full_queue_rejects() {
        let mut queue: MoveQueue<2> = MoveQueue::new();
        queue.push(segment(1, 1, 1)).unwrap();
        queue.push(segment(1, 1, 1)).unwrap();
        assert!(queue.is_full());
        assert_eq!(queue.push(segment(9, 9, 9)), Err(MotionError::QueueFull));
        // A rejected push leaves the sums alone
        assert_eq!(queue.remaining(Axis::X), 2);
    }

    #[test]
    fn test_clear_resets_sums() {
        let mut queue: MoveQueue<4> = MoveQueue::new();
        queue.push(segment(7, 8, 9)).unwrap();
        queue.clear();
        assert!(queue.is_empty());
        assert!(!queue.has_outstanding_steps());
    }

    #[test]
    fn test_segment_validate() {
        assert_eq!(segment(0, 0, 0).validate(), Err(MotionError::InvalidArgument));
        assert_eq!(segment(1, 0, 0).validate(), Ok(()));

        let mut stalled = segment(0, 10, 0);
        stalled.velocity[1] = 0;
        assert_eq!(stalled.validate(), Err(MotionError::InvalidArgument));

        // Zero velocity is fine on an axis that does not move
        let mut idle_axis = segment(10, 0, 0);
        idle_axis.velocity[2] = 0;
        assert_eq!(idle_axis.validate(), Ok(()));
    }

    #[test]
    fn test_from_wire_message() {
        let msg = MoveQueueAdd {
            frame_id: 0x11,
            dir_mask: 0x05,
            velocity: [100, 200, 300],
            steps: [10_000, 20_000, 30_000],
            gains: [PidGains::new(1, 2, 3); AXIS_COUNT],
        };
        let seg = MoveSegment::from(&msg);
        assert_eq!(seg.frame_id, 0x11);
        assert_eq!(seg.dir_mask, 0x05);
        assert_eq!(seg.steps, [10_000, 20_000, 30_000]);
        assert_eq!(seg.velocity, [100, 200, 300]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Push([u32; 3]),
        Pop,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<[u16; 3]>().prop_map(|s| Op::Push([s[0] as u32, s[1] as u32, s[2] as u32])),
            Just(Op::Pop),
        ]
    }

    proptest! {
        #[test]
        fn prop_remaining_equals_queued_sum(ops in proptest::collection::vec(op(), 0..200)) {
            let mut queue: MoveQueue<16> = MoveQueue::new();
            let mut live = 0usize;
            for op in ops {
                match op {
                    Op::Push(steps) => {
                        if queue.push(segment(steps[0], steps[1], steps[2])).is_ok() {
                            live += 1;
                        }
                    }
                    Op::Pop => {
                        if queue.pop().is_some() {
                            live -= 1;
                        }
                    }
                }
                prop_assert_eq!(queue.len(), live);
                for axis in Axis::ALL {
                    let sum: u64 = queue.iter().map(|s| s.steps[axis.index()] as u64).sum();
                    prop_assert_eq!(queue.remaining(axis), sum);
                }
            }
        }
    }
}
