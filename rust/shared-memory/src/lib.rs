//! tricolor - Shared Memory Module
//!
//! The producer/consumer plumbing between one supervisor process and any
//! number of generator processes: a page-sized POSIX shared memory segment
//! holding a ring buffer of [`tricolor_core::Solution`] records, guarded by
//! named semaphores only. No locks, no shared-memory atomics.

pub mod channel;
pub mod error;
pub mod region;
pub mod ring;
pub mod sem;

pub use channel::{ReadError, SolutionChannel, WriteError};
pub use error::{Result, SemError, SharedMemoryError};
pub use region::{default_session, Role, SharedRegion};
pub use ring::{RingBuffer, RING_CAPACITY};
pub use sem::NamedSemaphore;

/// Size of the shared memory segment. The whole shared state must fit in
/// one page; `region` asserts this at compile time.
pub const REGION_SIZE: usize = 4096;
