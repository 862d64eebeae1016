//! Shared region lifecycle: one page of POSIX shared memory plus the two
//! named semaphores that coordinate access to it.
//!
//! The supervisor opens the region as [`Role::Master`]: it creates the OS
//! objects, initializes the state and unlinks everything on drop. Generators
//! attach as [`Role::Slave`] and only ever close their own handles, so a
//! departing generator can never pull resources out from under its siblings.

use crate::error::{Result, SharedMemoryError};
use crate::ring::RingBuffer;
use crate::sem::NamedSemaphore;
use crate::REGION_SIZE;
use nix::fcntl::OFlag;
use nix::sys::mman::{mmap, shm_open, shm_unlink, MapFlags, ProtFlags};
use nix::sys::stat::Mode;
use std::num::NonZeroUsize;
use std::ptr::NonNull;
use tracing::{debug, warn};

/// Who creates (and later unlinks) the backing OS objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Creates shm object and semaphores, initializes state, unlinks on drop
    Master,
    /// Attaches to existing objects, closes handles on drop
    Slave,
}

/// The exact bytes placed in the shared memory object.
///
/// `shutdown` is the broadcast flag every process polls: plain data written
/// and read only while the buffer mutex is held, so semaphore-count
/// semantics never carry its truth (the wake-up semaphore is advisory).
#[repr(C)]
pub(crate) struct SharedState {
    pub(crate) shutdown: u32,
    pub(crate) ring: RingBuffer,
}

impl SharedState {
    fn new() -> Self {
        Self {
            shutdown: 0,
            ring: RingBuffer::new(),
        }
    }
}

// The whole state must fit the fixed segment size.
const _: () = assert!(std::mem::size_of::<SharedState>() <= REGION_SIZE);

const REGION_LEN: NonZeroUsize = match NonZeroUsize::new(REGION_SIZE) {
    Some(len) => len,
    None => panic!("REGION_SIZE must be non-zero"),
};

/// Memory-mapped shared state plus the named synchronization primitives.
pub struct SharedRegion {
    state: NonNull<SharedState>,
    mutex: NamedSemaphore,
    shutdown_wake: NamedSemaphore,
    shm_name: String,
    role: Role,
}

// Access to the mapped state is serialized through the mutex semaphore; the
// handles themselves carry no thread affinity.
unsafe impl Send for SharedRegion {}
unsafe impl Sync for SharedRegion {}

impl SharedRegion {
    /// Creates the region and its semaphores (supervisor side).
    pub fn create(session: &str) -> Result<Self> {
        Self::with_role(session, Role::Master)
    }

    /// Attaches to a region the supervisor already created (generator side).
    pub fn attach(session: &str) -> Result<Self> {
        Self::with_role(session, Role::Slave)
    }

    fn with_role(session: &str, role: Role) -> Result<Self> {
        let names = SessionNames::for_session(session)?;
        let is_master = role == Role::Master;

        // Semaphores first. If anything later fails, their RAII drop gives
        // the best-effort cleanup of partially created objects.
        let (mutex, shutdown_wake) = if is_master {
            (
                NamedSemaphore::create(&names.mutex, 1)?,
                NamedSemaphore::create(&names.shutdown, 0)?,
            )
        } else {
            (
                NamedSemaphore::open(&names.mutex)?,
                NamedSemaphore::open(&names.shutdown)?,
            )
        };

        let opened = if is_master {
            let mut created = shm_open(
                names.shm.as_str(),
                OFlag::O_CREAT | OFlag::O_EXCL | OFlag::O_RDWR,
                Mode::S_IRUSR | Mode::S_IWUSR,
            );
            if matches!(created, Err(nix::Error::EEXIST)) {
                // Leftover segment from a crashed run, or a second
                // supervisor on the same session. Reclaim it, loudly.
                warn!(name = %names.shm, "segment name already taken, unlinking and recreating");
                let _ = shm_unlink(names.shm.as_str());
                created = shm_open(
                    names.shm.as_str(),
                    OFlag::O_CREAT | OFlag::O_EXCL | OFlag::O_RDWR,
                    Mode::S_IRUSR | Mode::S_IWUSR,
                );
            }
            created
        } else {
            shm_open(names.shm.as_str(), OFlag::O_RDWR, Mode::empty())
        };
        let fd = opened.map_err(|e| SharedMemoryError::ShmOpen {
            name: names.shm.clone(),
            source: e,
        })?;

        if is_master {
            nix::unistd::ftruncate(&fd, REGION_SIZE as i64).map_err(|e| {
                let _ = shm_unlink(names.shm.as_str());
                SharedMemoryError::Truncate {
                    size: REGION_SIZE,
                    source: e,
                }
            })?;
        }

        let ptr = unsafe {
            mmap(
                None,
                REGION_LEN,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                Some(&fd),
                0,
            )
        }
        .map_err(|e| {
            if is_master {
                let _ = shm_unlink(names.shm.as_str());
            }
            SharedMemoryError::Map { source: e }
        })?;
        // The mapping keeps the object alive; the descriptor can go.
        drop(fd);

        let state = match NonNull::new(ptr as *mut SharedState) {
            Some(state) => state,
            None => {
                if is_master {
                    let _ = shm_unlink(names.shm.as_str());
                }
                return Err(SharedMemoryError::Map {
                    source: nix::Error::EINVAL,
                });
            }
        };

        if is_master {
            unsafe { state.as_ptr().write(SharedState::new()) };
        }

        debug!(session, ?role, "shared region ready");
        Ok(Self {
            state,
            mutex,
            shutdown_wake,
            shm_name: names.shm,
            role,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub(crate) fn state(&self) -> *mut SharedState {
        self.state.as_ptr()
    }

    pub(crate) fn mutex(&self) -> &NamedSemaphore {
        &self.mutex
    }

    pub(crate) fn shutdown_wake(&self) -> &NamedSemaphore {
        &self.shutdown_wake
    }
}

impl Drop for SharedRegion {
    fn drop(&mut self) {
        if unsafe { libc::munmap(self.state.as_ptr().cast(), REGION_SIZE) } != 0 {
            warn!(
                "munmap of '{}' failed: {}",
                self.shm_name,
                std::io::Error::last_os_error()
            );
        }
        if self.role == Role::Master {
            let _ = shm_unlink(self.shm_name.as_str());
        }
        // The semaphores close (and, for the master, unlink) themselves.
    }
}

/// OS object names derived from one session name, so independent runs can
/// coexist on the same machine.
struct SessionNames {
    shm: String,
    mutex: String,
    shutdown: String,
}

impl SessionNames {
    fn for_session(session: &str) -> Result<Self> {
        let valid = !session.is_empty()
            && session.len() <= 64
            && session
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(SharedMemoryError::InvalidName(session.to_string()));
        }

        Ok(Self {
            shm: format!("/{session}-buf"),
            mutex: format!("/{session}-mutex"),
            shutdown: format!("/{session}-shutdown"),
        })
    }
}

/// Default session name: stable per user, so a supervisor and its generators
/// agree without extra flags, while different users never collide. Pass
/// `--session` for concurrent runs by the same user.
pub fn default_session() -> String {
    format!("tricolor-{}", unsafe { libc::getuid() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_session(tag: &str) -> String {
        format!("tricolor-test-{}-{}", tag, uuid::Uuid::new_v4().simple())
    }

    #[test]
    fn test_master_creates_and_slave_attaches() {
        let session = unique_session("attach");
        let master = SharedRegion::create(&session).unwrap();
        let slave = SharedRegion::attach(&session).unwrap();

        assert_eq!(master.role(), Role::Master);
        assert_eq!(slave.role(), Role::Slave);
    }

    #[test]
    fn test_slave_cannot_attach_without_master() {
        assert!(SharedRegion::attach(&unique_session("orphan")).is_err());
    }

    #[test]
    fn test_master_initializes_empty_state() {
        let session = unique_session("init");
        let master = SharedRegion::create(&session).unwrap();

        let state = unsafe { &*master.state() };
        assert_eq!(state.shutdown, 0);
        assert!(state.ring.is_empty());
    }

    #[test]
    fn test_second_master_reclaims_session_with_fresh_state() {
        let session = unique_session("reclaim");
        let stale = SharedRegion::create(&session).unwrap();
        unsafe { (*stale.state()).shutdown = 1 };

        let fresh = SharedRegion::create(&session).unwrap();
        let state = unsafe { &*fresh.state() };
        assert_eq!(state.shutdown, 0);
        assert!(state.ring.is_empty());
    }

    #[test]
    fn test_master_unlinks_on_drop() {
        let session = unique_session("unlink");
        drop(SharedRegion::create(&session).unwrap());
        assert!(SharedRegion::attach(&session).is_err());
    }

    #[test]
    fn test_slave_drop_leaves_objects_alive() {
        let session = unique_session("siblings");
        let _master = SharedRegion::create(&session).unwrap();

        drop(SharedRegion::attach(&session).unwrap());
        assert!(SharedRegion::attach(&session).is_ok());
    }

    #[test]
    fn test_rejects_unusable_session_names() {
        assert!(SharedRegion::create("").is_err());
        assert!(SharedRegion::create("has/slash").is_err());
        assert!(SharedRegion::create("has space").is_err());
        assert!(SharedRegion::create(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_default_session_is_stable() {
        assert_eq!(default_session(), default_session());
        assert!(SessionNames::for_session(&default_session()).is_ok());
    }
}
