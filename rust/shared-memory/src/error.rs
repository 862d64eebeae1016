//! Shared memory specific error types

use thiserror::Error;

/// A failed `sem_wait`/`sem_post`/`sem_timedwait` call.
///
/// Always fatal to the calling process: once a semaphore operation fails the
/// buffer invariants can no longer be trusted.
#[derive(Error, Debug)]
#[error("semaphore {op} failed: {source}")]
pub struct SemError {
    /// Which operation failed, e.g. `"wait"` or `"post"`
    pub op: &'static str,
    #[source]
    pub source: std::io::Error,
}

/// Setup and teardown errors for the shared region and its semaphores
#[derive(Error, Debug)]
pub enum SharedMemoryError {
    /// Session name unusable as a POSIX object name
    #[error("invalid session name '{0}': use 1-64 characters from [A-Za-z0-9_-]")]
    InvalidName(String),

    /// `sem_open` failure (create or attach)
    #[error("opening semaphore '{name}' failed: {source}")]
    Semaphore {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// `shm_open` failure (create or attach)
    #[error("opening shared memory '{name}' failed: {source}")]
    ShmOpen {
        name: String,
        #[source]
        source: nix::Error,
    },

    /// `ftruncate` failure while sizing the freshly created segment
    #[error("sizing shared memory to {size} bytes failed: {source}")]
    Truncate {
        size: usize,
        #[source]
        source: nix::Error,
    },

    /// `mmap` failure
    #[error("mapping shared memory failed: {source}")]
    Map {
        #[source]
        source: nix::Error,
    },

    /// Semaphore operation failure after setup
    #[error(transparent)]
    Sync(#[from] SemError),
}

/// Convenience type alias
pub type Result<T> = std::result::Result<T, SharedMemoryError>;
