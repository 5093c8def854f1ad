//! Liveness checks for queue entries.
//!
//! A record is stale when its process is gone or its window no longer exists.
//! The two predicates are independent; [`crate::cleanup`] sweeps with each.
//!
//! PIDs can be reused by the OS. A recycled PID makes a dead session look alive
//! until the window sweep or an explicit removal catches it.

use std::collections::HashSet;

use sysinfo::{Pid, ProcessRefreshKind, System};

/// Returns true if `pid` refers to an existing process.
///
/// Non-positive PIDs are never alive. A process we aren't allowed to signal
/// (`EPERM`) still exists.
pub fn is_process_alive(pid: i64) -> bool {
    if pid <= 0 {
        return false;
    }

    #[cfg(unix)]
    {
        let Ok(pid) = libc::pid_t::try_from(pid) else {
            return false;
        };
        // SAFETY: kill with signal 0 performs only the existence and permission
        // check; no signal is delivered.
        #[allow(unsafe_code)]
        let rc = unsafe { libc::kill(pid, 0) };
        rc == 0 || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }
    #[cfg(not(unix))]
    {
        false
    }
}

/// Returns true if `window_id` is untracked (empty) or in `valid`.
pub fn is_window_valid(window_id: &str, valid: &HashSet<String>) -> bool {
    window_id.is_empty() || valid.contains(window_id)
}

/// Parent PID of `pid`, if the process can be inspected.
pub fn parent_pid_of(pid: u32) -> Option<u32> {
    let mut sys = System::new();
    let sys_pid = Pid::from_u32(pid);
    if !sys.refresh_process_specifics(sys_pid, ProcessRefreshKind::new()) {
        return None;
    }
    sys.process(sys_pid)
        .and_then(|process| process.parent())
        .map(|parent| parent.as_u32())
}

/// Walks `hops` steps up the process tree from the current process.
///
/// Hook commands usually run as `agent → sh → cc-queue`, so two hops reach the
/// agent process, which lives as long as the session. Falls back to the
/// immediate parent if any step can't be resolved.
pub fn ancestor_pid(hops: usize) -> u32 {
    let parent = own_parent_pid();

    let mut current = parent;
    for _ in 1..hops {
        match parent_pid_of(current) {
            Some(next) if next != 0 => current = next,
            _ => return parent,
        }
    }
    current
}

#[cfg(unix)]
fn own_parent_pid() -> u32 {
    std::os::unix::process::parent_id()
}

#[cfg(not(unix))]
fn own_parent_pid() -> u32 {
    parent_pid_of(std::process::id()).unwrap_or(0)
}
