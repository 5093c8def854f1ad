//! Exclusive advisory locking for session files.
//!
//! Writers from independent hook processes serialize on an exclusive `flock`
//! of the session file itself. The lock spans one read-modify-write cycle.
//!
//! # Platform Dependency
//!
//! A process killed while holding the lock is not cleaned up here. Correctness
//! relies on the kernel dropping `flock` locks when the last descriptor for the
//! open file description closes, which includes process exit.
//!
//! `flock` contends per open file description, so two handles opened separately
//! in one process (e.g. two threads) block each other the same way two
//! processes do.

use std::fs::File;
use std::io;

/// File locking capability. Swap in tests to avoid real descriptors.
pub trait Locker {
    /// Blocks until an exclusive lock on `file` is held.
    fn lock(&self, file: &File) -> io::Result<()>;

    fn unlock(&self, file: &File) -> io::Result<()>;
}

impl<L: Locker + ?Sized> Locker for &L {
    fn lock(&self, file: &File) -> io::Result<()> {
        (**self).lock(file)
    }

    fn unlock(&self, file: &File) -> io::Result<()> {
        (**self).unlock(file)
    }
}

/// `flock(2)` based locker. Blocks with no timeout.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlockLocker;

impl Locker for FlockLocker {
    fn lock(&self, file: &File) -> io::Result<()> {
        flock(file, FlockOp::Exclusive)
    }

    fn unlock(&self, file: &File) -> io::Result<()> {
        flock(file, FlockOp::Unlock)
    }
}

/// Locker that never blocks. For single-writer tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLocker;

impl Locker for NoopLocker {
    fn lock(&self, _file: &File) -> io::Result<()> {
        Ok(())
    }

    fn unlock(&self, _file: &File) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum FlockOp {
    Exclusive,
    Unlock,
}

#[cfg(unix)]
fn flock(file: &File, op: FlockOp) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let operation = match op {
        FlockOp::Exclusive => libc::LOCK_EX,
        FlockOp::Unlock => libc::LOCK_UN,
    };
    let fd = file.as_raw_fd();

    loop {
        // SAFETY: flock only reads the descriptor number. `fd` is borrowed from a
        // live `File`, so it stays open for the duration of the call.
        #[allow(unsafe_code)]
        let rc = unsafe { libc::flock(fd, operation) };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

#[cfg(not(unix))]
fn flock(_file: &File, op: FlockOp) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("flock {:?} not supported on this platform", op),
    ))
}

/// Holds a lock until dropped. Unlock runs on every exit path.
pub(crate) struct LockGuard<'a, L: Locker> {
    locker: &'a L,
    file: &'a File,
}

impl<'a, L: Locker> LockGuard<'a, L> {
    pub(crate) fn acquire(locker: &'a L, file: &'a File) -> io::Result<Self> {
        locker.lock(file)?;
        Ok(LockGuard { locker, file })
    }
}

impl<L: Locker> Drop for LockGuard<'_, L> {
    fn drop(&mut self) {
        if let Err(err) = self.locker.unlock(self.file) {
            tracing::warn!(error = %err, "Failed to release session file lock");
        }
    }
}
