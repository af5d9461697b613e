use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use relayvisor::supervisor::ProcessHandle;

#[derive(Debug)]
struct FakeState {
    exited: AtomicBool,
    responsive: AtomicBool,
    exit_on_kill: AtomicBool,
    fail_kill: AtomicBool,
    kills: AtomicUsize,
    releases: AtomicUsize,
}

/// Observer/controller for a [`FakeProcess`] that stays valid after the
/// supervisor has dropped the process.
#[derive(Debug, Clone)]
pub struct FakeProcessProbe {
    state: Arc<FakeState>,
}

impl FakeProcessProbe {
    /// Number of `start_kill` calls.
    pub fn kills(&self) -> usize {
        self.state.kills.load(Ordering::SeqCst)
    }

    /// Number of times the handle was dropped (released).
    pub fn releases(&self) -> usize {
        self.state.releases.load(Ordering::SeqCst)
    }

    pub fn set_exited(&self, val: bool) {
        self.state.exited.store(val, Ordering::SeqCst);
    }

    pub fn set_responsive(&self, val: bool) {
        self.state.responsive.store(val, Ordering::SeqCst);
    }

    /// If false, a kill does not make the process exit; call `set_exited`
    /// to finish it.
    pub fn set_exit_on_kill(&self, val: bool) {
        self.state.exit_on_kill.store(val, Ordering::SeqCst);
    }

    /// Make `start_kill` fail with `PermissionDenied`.
    pub fn set_fail_kill(&self, val: bool) {
        self.state.fail_kill.store(val, Ordering::SeqCst);
    }
}

/// In-memory process: starts running and responsive, exits when killed.
#[derive(Debug)]
pub struct FakeProcess {
    pid: u32,
    state: Arc<FakeState>,
}

impl FakeProcess {
    pub fn new(pid: u32) -> (Self, FakeProcessProbe) {
        let state = Arc::new(FakeState {
            exited: AtomicBool::new(false),
            responsive: AtomicBool::new(true),
            exit_on_kill: AtomicBool::new(true),
            fail_kill: AtomicBool::new(false),
            kills: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
        });
        let probe = FakeProcessProbe {
            state: Arc::clone(&state),
        };
        (Self { pid, state }, probe)
    }

    pub fn boxed(pid: u32) -> (Box<dyn ProcessHandle>, FakeProcessProbe) {
        let (process, probe) = Self::new(pid);
        (Box::new(process), probe)
    }
}

impl ProcessHandle for FakeProcess {
    fn id(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn has_exited(&mut self) -> io::Result<bool> {
        Ok(self.state.exited.load(Ordering::SeqCst))
    }

    fn is_responsive(&mut self) -> bool {
        self.state.responsive.load(Ordering::SeqCst)
    }

    fn start_kill(&mut self) -> io::Result<()> {
        self.state.kills.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_kill.load(Ordering::SeqCst) {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        if self.state.exit_on_kill.load(Ordering::SeqCst) {
            self.state.exited.store(true, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl Drop for FakeProcess {
    fn drop(&mut self) {
        self.state.releases.fetch_add(1, Ordering::SeqCst);
    }
}
