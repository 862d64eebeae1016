//! Fixed-capacity FIFO ring over whole `Solution` slots
//!
//! This type is the raw container that lives inside the shared segment. It
//! performs no synchronization of its own; exclusivity is the job of the
//! channel layer above.

use crate::REGION_SIZE;
use thiserror::Error;
use tricolor_core::Solution;

/// Bytes of shared-state bookkeeping outside the slot array: the shutdown
/// flag plus head/tail/count.
const HEADER_BYTES: usize = 4 * std::mem::size_of::<u32>();

/// Slots per ring, derived so the whole shared state stays within one page.
pub const RING_CAPACITY: usize = (REGION_SIZE - HEADER_BYTES) / std::mem::size_of::<Solution>();

/// Write attempted on a full ring; rejected without mutating state.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("ring buffer is full")]
pub struct Full;

/// Read attempted on an empty ring; rejected without mutating state.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("ring buffer is empty")]
pub struct Empty;

/// Invariants: `count <= RING_CAPACITY` and
/// `head == (tail + count) % RING_CAPACITY`.
#[repr(C)]
pub struct RingBuffer {
    head: u32,
    tail: u32,
    count: u32,
    slots: [Solution; RING_CAPACITY],
}

impl RingBuffer {
    pub fn new() -> Self {
        Self {
            head: 0,
            tail: 0,
            count: 0,
            slots: [Solution::COLORABLE; RING_CAPACITY],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count as usize == RING_CAPACITY
    }

    pub fn len(&self) -> u32 {
        self.count
    }

    pub fn push(&mut self, solution: Solution) -> Result<(), Full> {
        if self.is_full() {
            return Err(Full);
        }

        self.slots[self.head as usize] = solution;
        self.head = (self.head + 1) % RING_CAPACITY as u32;
        self.count += 1;

        Ok(())
    }

    pub fn pop(&mut self) -> Result<Solution, Empty> {
        if self.is_empty() {
            return Err(Empty);
        }

        let solution = self.slots[self.tail as usize];
        self.tail = (self.tail + 1) % RING_CAPACITY as u32;
        self.count -= 1;

        Ok(solution)
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new()
    }
}
