// src/supervisor/process.rs

//! The supervised child process.
//!
//! The supervisor talks to a [`ProcessHandle`] instead of a raw
//! `tokio::process::Child`. Production code uses [`ChildProcess`]; tests can
//! plug in a fake that records kill and release calls.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info};

use crate::errors::{Result, SupervisorError};

/// Minimal view of a running process used for health checks and teardown.
///
/// Every method must be non-blocking: they are called with the supervisor's
/// handle lock held, from reader tasks as well as from the polling loop.
pub trait ProcessHandle: Send {
    /// OS process id, if still known.
    fn id(&self) -> Option<u32>;

    /// Non-blocking exit check; reaps the process once it has exited.
    fn has_exited(&mut self) -> io::Result<bool>;

    /// Liveness probe for a process that has not exited.
    fn is_responsive(&mut self) -> bool;

    /// Request termination without waiting for it.
    fn start_kill(&mut self) -> io::Result<()>;
}

/// What to run and where.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub executable: PathBuf,
    pub args: Vec<OsString>,
    /// The relay is only reliable when started from its bundle directory,
    /// so this is required rather than inherited.
    pub working_dir: PathBuf,
}

/// Production handle wrapping a Tokio child.
#[derive(Debug)]
pub struct ChildProcess {
    child: Child,
    pid: Option<u32>,
}

impl ChildProcess {
    pub fn new(child: Child) -> Self {
        let pid = child.id();
        Self { child, pid }
    }
}

impl ProcessHandle for ChildProcess {
    fn id(&self) -> Option<u32> {
        self.pid
    }

    fn has_exited(&mut self) -> io::Result<bool> {
        match self.child.try_wait()? {
            Some(status) => {
                debug!(pid = ?self.pid, ?status, "relay process reaped");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn is_responsive(&mut self) -> bool {
        match self.pid {
            Some(pid) => probe_liveness(pid),
            None => false,
        }
    }

    fn start_kill(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }
}

/// Spawn the relay with both output pipes captured.
///
/// No shell is involved: `executable` is executed directly with `args`.
pub fn spawn_child(spec: &LaunchSpec) -> Result<(ChildProcess, ChildStdout, ChildStderr)> {
    let launch_err = |source: io::Error| SupervisorError::Launch {
        executable: spec.executable.clone(),
        source,
    };

    if !spec.working_dir.is_dir() {
        return Err(launch_err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("working directory {:?} does not exist", spec.working_dir),
        )));
    }
    if !spec.executable.is_file() {
        return Err(launch_err(io::Error::new(
            io::ErrorKind::NotFound,
            "executable not found",
        )));
    }

    let mut cmd = Command::new(&spec.executable);
    cmd.args(&spec.args)
        .current_dir(&spec.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(windows)]
    {
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }

    let mut child = cmd.spawn().map_err(launch_err)?;

    let stdout = child.stdout.take().ok_or_else(|| {
        launch_err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout was not captured"))
    })?;
    let stderr = child.stderr.take().ok_or_else(|| {
        launch_err(io::Error::new(io::ErrorKind::BrokenPipe, "stderr was not captured"))
    })?;

    let process = ChildProcess::new(child);
    info!(
        pid = ?process.id(),
        executable = ?spec.executable,
        args = ?spec.args,
        cwd = ?spec.working_dir,
        "relay process started"
    );

    Ok((process, stdout, stderr))
}

/// A stopped (job-control or ptrace) or zombie process does not count as
/// responsive.
#[cfg(target_os = "linux")]
fn probe_liveness(pid: u32) -> bool {
    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    match procfs::process::Process::new(pid).and_then(|p| p.stat()) {
        Ok(stat) => !matches!(stat.state, 'T' | 't' | 'Z' | 'X' | 'x'),
        Err(e) => {
            debug!(pid, error = %e, "liveness probe could not read process state");
            false
        }
    }
}

#[cfg(all(unix, not(target_os = "linux")))]
fn probe_liveness(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    kill(Pid::from_raw(pid), None).is_ok()
}

#[cfg(not(unix))]
fn probe_liveness(_pid: u32) -> bool {
    true
}
