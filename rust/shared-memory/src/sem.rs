//! RAII wrapper around POSIX named semaphores
//!
//! `nix` has no binding for the `sem_*` family, so this goes through `libc`
//! directly. One wrapper serves both roles: the creating process owns the
//! name and unlinks it on drop, attaching processes only close their handle.

use crate::error::{SemError, SharedMemoryError, Result};
use std::ffi::CString;
use std::time::Duration;
use tracing::{debug, error, warn};

pub struct NamedSemaphore {
    sem: *mut libc::sem_t,
    name: CString,
    owner: bool,
}

// The sem_t handle is process-shared by definition; the wrapper itself holds
// no thread-local state.
unsafe impl Send for NamedSemaphore {}
unsafe impl Sync for NamedSemaphore {}

impl NamedSemaphore {
    /// Creates the named semaphore with the given initial value.
    ///
    /// The name is claimed with `O_EXCL` first. Only when that fails with
    /// `EEXIST` is the existing object unlinked and the create retried, so a
    /// leftover from a crashed run is reclaimed while a collision with a
    /// live session at least leaves a warning behind.
    pub fn create(name: &str, initial: u32) -> Result<Self> {
        let c_name = c_name(name)?;

        let mut sem = open_exclusive(&c_name, initial);
        if sem == libc::SEM_FAILED
            && std::io::Error::last_os_error().raw_os_error() == Some(libc::EEXIST)
        {
            warn!(name, "semaphore name already taken, unlinking and recreating");
            unsafe { libc::sem_unlink(c_name.as_ptr()) };
            sem = open_exclusive(&c_name, initial);
        }
        if sem == libc::SEM_FAILED {
            return Err(SharedMemoryError::Semaphore {
                name: name.to_string(),
                source: std::io::Error::last_os_error(),
            });
        }

        debug!(name, initial, "semaphore created");
        Ok(Self {
            sem,
            name: c_name,
            owner: true,
        })
    }

    /// Attaches to a semaphore some other process created.
    pub fn open(name: &str) -> Result<Self> {
        let c_name = c_name(name)?;

        let sem = unsafe { libc::sem_open(c_name.as_ptr(), 0) };
        if sem == libc::SEM_FAILED {
            return Err(SharedMemoryError::Semaphore {
                name: name.to_string(),
                source: std::io::Error::last_os_error(),
            });
        }

        debug!(name, "semaphore attached");
        Ok(Self {
            sem,
            name: c_name,
            owner: false,
        })
    }

    /// Blocking wait. Retries on `EINTR`; interrupt handling belongs to the
    /// caller's loop, not to the critical section.
    pub fn wait(&self) -> std::result::Result<(), SemError> {
        loop {
            if unsafe { libc::sem_wait(self.sem) } == 0 {
                return Ok(());
            }
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EINTR) {
                continue;
            }
            return Err(SemError { op: "wait", source: err });
        }
    }

    /// Bounded wait, used as an interruptible sleep: returns `true` when the
    /// semaphore was decremented, `false` on timeout or signal delivery.
    pub fn wait_timeout(&self, timeout: Duration) -> std::result::Result<bool, SemError> {
        let deadline = absolute_deadline(timeout)?;

        if unsafe { libc::sem_timedwait(self.sem, &deadline) } == 0 {
            return Ok(true);
        }

        let err = std::io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::ETIMEDOUT) | Some(libc::EINTR) => Ok(false),
            _ => Err(SemError {
                op: "timedwait",
                source: err,
            }),
        }
    }

    pub fn post(&self) -> std::result::Result<(), SemError> {
        if unsafe { libc::sem_post(self.sem) } == 0 {
            Ok(())
        } else {
            Err(SemError {
                op: "post",
                source: std::io::Error::last_os_error(),
            })
        }
    }
}

impl Drop for NamedSemaphore {
    fn drop(&mut self) {
        unsafe {
            if libc::sem_close(self.sem) != 0 {
                error!(
                    name = ?self.name,
                    "sem_close failed: {}",
                    std::io::Error::last_os_error()
                );
            }
            if self.owner {
                libc::sem_unlink(self.name.as_ptr());
            }
        }
    }
}

fn open_exclusive(name: &CString, initial: u32) -> *mut libc::sem_t {
    unsafe {
        libc::sem_open(
            name.as_ptr(),
            libc::O_CREAT | libc::O_EXCL,
            0o600 as libc::c_uint,
            initial as libc::c_uint,
        )
    }
}

fn c_name(name: &str) -> Result<CString> {
    CString::new(name).map_err(|_| SharedMemoryError::InvalidName(name.to_string()))
}

/// `sem_timedwait` takes an absolute `CLOCK_REALTIME` deadline.
fn absolute_deadline(timeout: Duration) -> std::result::Result<libc::timespec, SemError> {
    let mut now = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    if unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut now) } != 0 {
        return Err(SemError {
            op: "timedwait",
            source: std::io::Error::last_os_error(),
        });
    }

    let mut sec = now.tv_sec + timeout.as_secs() as libc::time_t;
    let mut nsec = now.tv_nsec + timeout.subsec_nanos() as libc::c_long;
    if nsec >= 1_000_000_000 {
        sec += 1;
        nsec -= 1_000_000_000;
    }

    Ok(libc::timespec {
        tv_sec: sec,
        tv_nsec: nsec,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_name(tag: &str) -> String {
        format!("/tricolor-test-{}-{}", tag, uuid::Uuid::new_v4().simple())
    }

    #[test]
    fn test_create_wait_post_cycle() {
        let name = unique_name("cycle");
        let sem = NamedSemaphore::create(&name, 1).unwrap();

        sem.wait().unwrap();
        sem.post().unwrap();
        sem.wait().unwrap();
    }

    #[test]
    fn test_attach_sees_creator_posts() {
        let name = unique_name("attach");
        let creator = NamedSemaphore::create(&name, 0).unwrap();
        let attached = NamedSemaphore::open(&name).unwrap();

        creator.post().unwrap();
        assert!(attached.wait_timeout(Duration::from_millis(200)).unwrap());
    }

    #[test]
    fn test_wait_timeout_expires_when_unposted() {
        let name = unique_name("timeout");
        let sem = NamedSemaphore::create(&name, 0).unwrap();

        let start = std::time::Instant::now();
        assert!(!sem.wait_timeout(Duration::from_millis(50)).unwrap());
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn test_create_reclaims_existing_name() {
        let name = unique_name("reclaim");
        let stale = NamedSemaphore::create(&name, 0).unwrap();

        // The second create must take the EEXIST path, not fail outright,
        // and the reclaimed semaphore must carry the fresh initial value.
        let fresh = NamedSemaphore::create(&name, 1).unwrap();
        fresh.wait().unwrap();
        assert!(!fresh.wait_timeout(Duration::from_millis(50)).unwrap());

        drop(stale);
    }

    #[test]
    fn test_open_missing_semaphore_fails() {
        assert!(NamedSemaphore::open(&unique_name("missing")).is_err());
    }

    #[test]
    fn test_owner_unlinks_on_drop() {
        let name = unique_name("unlink");
        drop(NamedSemaphore::create(&name, 0).unwrap());
        assert!(NamedSemaphore::open(&name).is_err());
    }
}
