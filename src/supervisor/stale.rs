// src/supervisor/stale.rs

//! Process-wide sweep for relay instances left behind by a previous run.
//!
//! Listing and killing are separate steps: [`find_stale_instances`] only
//! reads the host's process table, and [`try_kill`] reports failure as
//! `false` so that permission denial in a locked-down host reads as an
//! expected outcome rather than a fault.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

/// Kernel limit on the stored command name (`TASK_COMM_LEN - 1`).
const COMM_MAX_LEN: usize = 15;

/// A running process that looks like a relay instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleProcess {
    pub pid: u32,
    pub name: String,
    pub exe: Option<PathBuf>,
}

/// Whether a process with command name `comm` and executable `exe` is an
/// instance of `process_name`.
pub fn matches_process_name(process_name: &str, comm: &str, exe: Option<&Path>) -> bool {
    if process_name.is_empty() {
        return false;
    }
    if comm == process_name {
        return true;
    }
    // The kernel truncates long names.
    if process_name.len() > COMM_MAX_LEN
        && process_name.is_char_boundary(COMM_MAX_LEN)
        && comm == &process_name[..COMM_MAX_LEN]
    {
        return true;
    }
    exe.and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem == process_name)
}

/// List processes on this host matching `process_name`, excluding the
/// current process and zombies.
#[cfg(target_os = "linux")]
pub fn find_stale_instances(process_name: &str) -> Vec<StaleProcess> {
    let own_pid = std::process::id();

    let procs = match procfs::process::all_processes() {
        Ok(procs) => procs,
        Err(e) => {
            warn!(error = %e, "stale sweep: cannot list processes");
            return Vec::new();
        }
    };

    procs
        .filter_map(|p| p.ok())
        .filter_map(|proc| {
            let stat = proc.stat().ok()?;
            let pid = u32::try_from(stat.pid).ok()?;
            if pid == own_pid || stat.state == 'Z' {
                return None;
            }
            let exe = proc.exe().ok();
            if !matches_process_name(process_name, &stat.comm, exe.as_deref()) {
                return None;
            }
            Some(StaleProcess {
                pid,
                name: stat.comm,
                exe,
            })
        })
        .collect()
}

#[cfg(not(target_os = "linux"))]
pub fn find_stale_instances(process_name: &str) -> Vec<StaleProcess> {
    debug!(
        process_name,
        "stale sweep: process listing not supported on this platform"
    );
    Vec::new()
}

/// Force-terminate `pid`. Returns `false` (after logging) on any failure.
#[cfg(unix)]
pub fn try_kill(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        warn!(pid, "stale sweep: pid out of range");
        return false;
    };

    match kill(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) => {
            info!(pid, "stale sweep: killed process");
            true
        }
        Err(Errno::ESRCH) => {
            debug!(pid, "stale sweep: process already gone");
            false
        }
        Err(Errno::EPERM) => {
            warn!(pid, "stale sweep: no permission to kill process");
            false
        }
        Err(e) => {
            warn!(pid, error = %e, "stale sweep: kill failed");
            false
        }
    }
}

#[cfg(not(unix))]
pub fn try_kill(pid: u32) -> bool {
    warn!(pid, "stale sweep: killing by pid is not supported on this platform");
    false
}

/// List and kill every stale instance of `process_name`. Returns how many
/// were killed.
pub fn try_kill_stale_instances(process_name: &str) -> usize {
    let stale = find_stale_instances(process_name);
    if stale.is_empty() {
        debug!(process_name, "stale sweep: nothing to kill");
        return 0;
    }

    let killed = stale.iter().filter(|p| try_kill(p.pid)).count();
    info!(
        process_name,
        found = stale.len(),
        killed,
        "stale sweep finished"
    );
    killed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_exact_command_name() {
        assert!(matches_process_name("rot", "rot", None));
        assert!(!matches_process_name("rot", "rotate", None));
    }

    #[test]
    fn matches_truncated_command_name() {
        assert!(matches_process_name(
            "relay-with-a-long-name",
            "relay-with-a-lo",
            None
        ));
    }

    #[test]
    fn matches_executable_stem() {
        assert!(matches_process_name(
            "rot",
            "something-else",
            Some(Path::new("/opt/bundle/Rot/rot"))
        ));
        assert!(!matches_process_name(
            "rot",
            "sh",
            Some(Path::new("/bin/sh"))
        ));
    }

    #[test]
    fn empty_name_never_matches() {
        assert!(!matches_process_name("", "", None));
    }
}
