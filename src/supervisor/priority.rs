// src/supervisor/priority.rs

use std::io;

/// Nice value one step above normal scheduling priority.
pub const ABOVE_NORMAL_NICE: i32 = -1;

/// Raise `pid` to [`ABOVE_NORMAL_NICE`].
///
/// Lowering a nice value usually needs privileges, so callers treat an
/// error here as a warning.
#[cfg(unix)]
pub fn raise_priority(pid: u32) -> io::Result<()> {
    // SAFETY: setpriority takes plain integers and touches no memory we own.
    let rc = unsafe {
        libc::setpriority(libc::PRIO_PROCESS, pid as libc::id_t, ABOVE_NORMAL_NICE)
    };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
pub fn raise_priority(_pid: u32) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "priority adjustment is not supported on this platform",
    ))
}
