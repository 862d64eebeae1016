//! The multi-writer/single-reader solution protocol over the shared ring
//!
//! One binary semaphore serializes every buffer access, writers and the one
//! reader alike, so the ring itself never needs interior synchronization.
//! The shutdown flag lives inside the shared state and is read as part of
//! the same critical section; the second semaphore is only a wake-up edge
//! for peers sleeping between polls, never the source of truth.

use crate::error::SemError;
use crate::region::SharedRegion;
use crate::sem::NamedSemaphore;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, trace};
use tricolor_core::Solution;

/// Why a write did not land
#[derive(Error, Debug)]
pub enum WriteError {
    /// Ring full; skip this round and try again with the next candidate
    #[error("solution channel is full")]
    Full,
    /// Shutdown flag observed; stop producing
    #[error("solution channel is shut down")]
    Shutdown,
    /// Semaphore failure; fatal, buffer invariants can't be trusted anymore
    #[error(transparent)]
    Sync(#[from] SemError),
}

/// Why a read returned nothing
#[derive(Error, Debug)]
pub enum ReadError {
    /// Nothing buffered yet; poll again
    #[error("solution channel is empty")]
    Empty,
    /// Semaphore failure; fatal
    #[error(transparent)]
    Sync(#[from] SemError),
}

/// Channel handle over an attached [`SharedRegion`].
#[derive(Clone, Copy)]
pub struct SolutionChannel<'a> {
    region: &'a SharedRegion,
}

/// Scoped mutex hold. Releasing on drop keeps every exit path (including
/// the error paths) from deadlocking the whole process group.
struct MutexGuard<'a> {
    sem: &'a NamedSemaphore,
}

impl Drop for MutexGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.sem.post() {
            // Nowhere to propagate from a drop; the peers are likely wedged.
            error!("releasing the buffer mutex failed: {e}");
        }
    }
}

impl<'a> SolutionChannel<'a> {
    pub fn new(region: &'a SharedRegion) -> Self {
        Self { region }
    }

    fn lock(&self) -> Result<MutexGuard<'a>, SemError> {
        self.region.mutex().wait()?;
        Ok(MutexGuard {
            sem: self.region.mutex(),
        })
    }

    /// Publishes one solution. Serialized against all other writers and the
    /// reader; FIFO order is preserved as seen by the single reader.
    pub fn write(&self, solution: &Solution) -> Result<(), WriteError> {
        let guard = self.lock()?;
        // Safety: the mutex semaphore is held, so no other process or thread
        // touches the state until the guard drops.
        let state = unsafe { &mut *self.region.state() };

        if state.shutdown != 0 {
            return Err(WriteError::Shutdown);
        }
        if state.ring.push(*solution).is_err() {
            return Err(WriteError::Full);
        }

        drop(guard);
        trace!(removed = solution.len(), "solution published");
        Ok(())
    }

    /// Takes the oldest buffered solution, or [`ReadError::Empty`] when
    /// there is nothing yet; that outcome means "poll again", not failure.
    pub fn read(&self) -> Result<Solution, ReadError> {
        let guard = self.lock()?;
        // Safety: as in `write`.
        let state = unsafe { &mut *self.region.state() };

        let solution = state.ring.pop().map_err(|_| ReadError::Empty)?;

        drop(guard);
        trace!(removed = solution.len(), "solution consumed");
        Ok(solution)
    }

    /// Raises the shutdown flag and posts one wake-up so a sleeping peer
    /// notices immediately. The flag is never lowered again; observers do
    /// not re-post anything.
    pub fn signal_shutdown(&self) -> Result<(), SemError> {
        {
            let _guard = self.lock()?;
            // Safety: as in `write`.
            unsafe { (*self.region.state()).shutdown = 1 };
        }
        debug!("shutdown signalled");
        self.region.shutdown_wake().post()
    }

    /// Polls the shutdown flag under the mutex.
    pub fn is_shut_down(&self) -> Result<bool, SemError> {
        let _guard = self.lock()?;
        // Safety: as in `write`.
        Ok(unsafe { (*self.region.state()).shutdown != 0 })
    }

    /// Interruptible sleep between polls: returns early if the shutdown
    /// wake-up fires. Callers re-check the flag either way.
    pub fn idle(&self, timeout: Duration) -> Result<(), SemError> {
        self.region.shutdown_wake().wait_timeout(timeout)?;
        Ok(())
    }
}
