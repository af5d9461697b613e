// src/supervisor/process_supervisor.rs

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::SupervisorSettings;
use crate::errors::{Result, SupervisorError};
use crate::fs::FileSystem;
use crate::template::materialize;
use crate::types::{HealthStatus, LineAction, StreamKind};

use super::artifacts::cleanup_stale_keys;
use super::classify::{LineClassifier, OutputEvent};
use super::descriptor::ConfigDescriptor;
use super::priority::raise_priority;
use super::process::{spawn_child, LaunchSpec, ProcessHandle};

/// Tracing target for re-emitted relay output.
pub const RELAY_OUTPUT_TARGET: &str = "relayvisor::relay";

/// Lifecycle of one supervisor. There is no way back to `Running`; a failed
/// relay is retried with a fresh supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    NotStarted,
    Running,
    Unresponsive,
    Exited,
    Disposed,
}

type Slot = Option<Box<dyn ProcessHandle>>;

/// State shared between the supervisor and its output reader tasks.
struct Shared {
    slot: Mutex<Slot>,
    classifier: LineClassifier,
    /// One-shot gate: every kill path swaps this first, so a fatal line and
    /// a concurrent shutdown produce a single kill.
    kill_issued: AtomicBool,
    /// One-shot gate for teardown.
    disposed: AtomicBool,
}

impl Shared {
    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn handle_line(&self, event: &OutputEvent) -> LineAction {
        let action = self.classifier.classify(event);
        match action {
            LineAction::Ignore => {}
            LineAction::Info => {
                info!(target: RELAY_OUTPUT_TARGET, stream = %event.stream, "{}", event.line);
            }
            LineAction::Error => {
                error!(target: RELAY_OUTPUT_TARGET, stream = %event.stream, "{}", event.line);
            }
            LineAction::KillNow => {
                error!(target: RELAY_OUTPUT_TARGET, stream = %event.stream, "{}", event.line);
                let pattern = self
                    .classifier
                    .fatal_patterns()
                    .find_in(&event.line)
                    .unwrap_or_default();
                warn!(pattern, "fatal condition in relay output; killing relay");
                self.request_kill("fatal output");
            }
        }
        action
    }

    /// Issue a kill unless one was already issued.
    fn request_kill(&self, reason: &'static str) -> KillOutcome {
        if self.kill_issued.swap(true, Ordering::SeqCst) {
            debug!(reason, "kill already issued");
            return KillOutcome::AlreadyIssued;
        }

        let mut slot = self.lock_slot();
        let Some(process) = slot.as_mut() else {
            debug!(reason, "kill requested without a process handle");
            return KillOutcome::NoProcess;
        };

        match process.start_kill() {
            Ok(()) => {
                info!(pid = ?process.id(), reason, "kill issued to relay process");
                KillOutcome::Sent
            }
            Err(source) => {
                // Let a later path retry.
                self.kill_issued.store(false, Ordering::SeqCst);
                let err = SupervisorError::Teardown {
                    operation: "kill",
                    source,
                };
                error!(pid = ?process.id(), reason, error = %err, "kill failed");
                KillOutcome::Failed
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KillOutcome {
    Sent,
    AlreadyIssued,
    NoProcess,
    Failed,
}

fn probe(process: &mut dyn ProcessHandle) -> HealthStatus {
    match process.has_exited() {
        Ok(true) => HealthStatus::Exited,
        Ok(false) if process.is_responsive() => HealthStatus::Healthy,
        Ok(false) => HealthStatus::Unresponsive,
        Err(e) => {
            warn!(pid = ?process.id(), error = %e, "exit check failed");
            HealthStatus::Unresponsive
        }
    }
}

/// Owns one relay process from launch to reaping.
pub struct ProcessSupervisor {
    settings: SupervisorSettings,
    shared: Arc<Shared>,
    launched: AtomicBool,
    readers: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for ProcessSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessSupervisor")
            .field("executable", &self.settings.executable)
            .field("launched", &self.launched.load(Ordering::SeqCst))
            .field("disposed", &self.shared.disposed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl ProcessSupervisor {
    pub fn new(settings: SupervisorSettings) -> Self {
        let classifier = LineClassifier::from_settings(&settings);
        Self {
            settings,
            shared: Arc::new(Shared {
                slot: Mutex::new(None),
                classifier,
                kill_issued: AtomicBool::new(false),
                disposed: AtomicBool::new(false),
            }),
            launched: AtomicBool::new(false),
            readers: Mutex::new(Vec::new()),
        }
    }

    /// Clean up stale identity files, materialize the relay config, spawn
    /// the relay and start reading its output.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn launch(&self, fs: &dyn FileSystem, descriptor: &ConfigDescriptor) -> Result<()> {
        self.claim_launch()?;

        if self.settings.cleanup_stale_keys {
            let removed = cleanup_stale_keys(fs, &self.settings.stale_key_dirs());
            info!(removed, "stale identity cleanup done");
        } else {
            debug!("stale identity cleanup disabled");
        }

        let config_path = materialize(
            fs,
            &descriptor.template_path,
            &descriptor.substitutions,
            &descriptor.output_path,
        )?;

        let spec = LaunchSpec {
            executable: self.settings.executable_path(),
            args: relay_args(&config_path, &descriptor.defaults_path, &self.settings.extra_args),
            working_dir: self.settings.base_dir.clone(),
        };

        let (process, stdout, stderr) = spawn_child(&spec)?;

        if self.settings.raise_priority {
            if let Some(pid) = process.id() {
                match raise_priority(pid) {
                    Ok(()) => debug!(pid, "relay priority raised"),
                    Err(e) => warn!(
                        pid,
                        operation = "raise_priority",
                        error = %e,
                        "could not raise relay priority; continuing at normal priority"
                    ),
                }
            }
        }

        self.install(Box::new(process));
        self.spawn_reader(StreamKind::Stdout, stdout);
        self.spawn_reader(StreamKind::Stderr, stderr);

        Ok(())
    }

    /// Supervise an already-running process instead of spawning one.
    pub fn attach(&self, process: Box<dyn ProcessHandle>) -> Result<()> {
        self.claim_launch()?;
        self.install(process);
        Ok(())
    }

    /// Feed a stream of relay output through the classifier in a background
    /// task.
    pub fn spawn_reader<R>(&self, stream: StreamKind, reader: R)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&buf);
                        let line = line.trim_end_matches(['\r', '\n']);
                        shared.handle_line(&OutputEvent::new(stream, line));
                    }
                    Err(e) => {
                        warn!(%stream, error = %e, "reading relay output failed");
                        break;
                    }
                }
            }
            debug!(%stream, "relay output stream closed");
        });
        self.lock_readers().push(handle);
    }

    /// Classify, log and act on one line of relay output.
    pub fn handle_line(&self, event: &OutputEvent) -> LineAction {
        self.shared.handle_line(event)
    }

    /// Current health, recomputed from the live handle. Every unhealthy
    /// outcome is logged with its reason.
    pub fn health(&self) -> HealthStatus {
        let status = {
            let mut slot = self.shared.lock_slot();
            match slot.as_mut() {
                None => HealthStatus::NoProcess,
                Some(process) => probe(process.as_mut()),
            }
        };
        if !status.is_healthy() {
            error!(reason = status.reason(), "relay health check failed");
        }
        status
    }

    pub fn is_healthy(&self) -> bool {
        self.health().is_healthy()
    }

    pub fn state(&self) -> SupervisorState {
        if self.shared.disposed.load(Ordering::SeqCst) {
            return SupervisorState::Disposed;
        }
        let mut slot = self.shared.lock_slot();
        match slot.as_mut() {
            None => SupervisorState::NotStarted,
            Some(process) => match probe(process.as_mut()) {
                HealthStatus::Healthy => SupervisorState::Running,
                HealthStatus::Unresponsive => SupervisorState::Unresponsive,
                HealthStatus::Exited | HealthStatus::NoProcess => SupervisorState::Exited,
            },
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.shared.lock_slot().as_ref().and_then(|p| p.id())
    }

    /// Kill the relay if it is still running, wait until it has exited,
    /// then release the handle.
    ///
    /// Only the first call does anything. Waiting polls every
    /// `kill_poll_interval` with no attempt limit, so a relay that ignores
    /// the kill stalls this call; wrap it in a timeout if a ceiling is
    /// needed. A kill that fails is logged and the handle is released
    /// without waiting. Failures are logged, never returned.
    pub async fn shutdown(&self) {
        if self.shared.disposed.swap(true, Ordering::SeqCst) {
            debug!("relay supervisor already shut down");
            return;
        }

        let running = {
            let mut slot = self.shared.lock_slot();
            match slot.as_mut() {
                None => false,
                Some(process) => match process.has_exited() {
                    Ok(exited) => !exited,
                    Err(source) => {
                        log_teardown("exit check", source);
                        true
                    }
                },
            }
        };

        if running {
            info!(pid = ?self.pid(), "stopping relay process");
            match self.shared.request_kill("shutdown") {
                // Waiting on a process we could not kill would never end.
                KillOutcome::Failed => warn!("relay kill failed; releasing without waiting"),
                KillOutcome::Sent | KillOutcome::AlreadyIssued | KillOutcome::NoProcess => {
                    self.wait_for_exit().await
                }
            }
        }

        self.release();
    }

    async fn wait_for_exit(&self) {
        let mut attempts: u64 = 0;
        loop {
            let exited = {
                let mut slot = self.shared.lock_slot();
                match slot.as_mut() {
                    None => true,
                    Some(process) => match process.has_exited() {
                        Ok(exited) => exited,
                        Err(source) => {
                            log_teardown("wait for exit", source);
                            true
                        }
                    },
                }
            };

            if exited {
                debug!(attempts, "relay process exited");
                return;
            }

            // A kill from a reader task may have failed and reopened the gate.
            if !self.shared.kill_issued.load(Ordering::SeqCst)
                && self.shared.request_kill("shutdown retry") == KillOutcome::Failed
            {
                warn!(attempts, "relay kill retry failed; giving up on waiting");
                return;
            }

            attempts += 1;
            if attempts % 25 == 0 {
                warn!(attempts, "relay process still running after kill");
            }
            tokio::time::sleep(self.settings.kill_poll_interval).await;
        }
    }

    fn release(&self) {
        let taken = self.shared.lock_slot().take();
        match taken {
            Some(process) => {
                let pid = process.id();
                drop(process);
                info!(pid = ?pid, "relay process handle released");
            }
            None => debug!("no relay process handle to release"),
        }
        for reader in self.lock_readers().drain(..) {
            reader.abort();
        }
    }

    fn claim_launch(&self) -> Result<()> {
        let refuse = |msg: &str| SupervisorError::Launch {
            executable: self.settings.executable_path(),
            source: io::Error::new(io::ErrorKind::AlreadyExists, msg.to_string()),
        };
        if self.shared.disposed.load(Ordering::SeqCst) {
            return Err(refuse("supervisor already shut down"));
        }
        if self.launched.swap(true, Ordering::SeqCst) {
            return Err(refuse("supervisor already launched; build a new one to retry"));
        }
        Ok(())
    }

    fn install(&self, process: Box<dyn ProcessHandle>) {
        *self.shared.lock_slot() = Some(process);
    }

    fn lock_readers(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.readers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        if self.shared.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let taken = self.shared.lock_slot().take();
        if let Some(mut process) = taken {
            if !matches!(process.has_exited(), Ok(true))
                && !self.shared.kill_issued.swap(true, Ordering::SeqCst)
            {
                warn!(pid = ?process.id(), "supervisor dropped without shutdown; killing relay");
                if let Err(source) = process.start_kill() {
                    log_teardown("kill on drop", source);
                }
            }
        }
        for reader in self.lock_readers().drain(..) {
            reader.abort();
        }
    }
}

fn log_teardown(operation: &'static str, source: io::Error) {
    let err = SupervisorError::Teardown { operation, source };
    error!(error = %err, "relay teardown step failed");
}

/// `-f <config> --defaults-torrc <defaults> [extra...]`
pub fn relay_args(config: &Path, defaults: &Path, extra: &[String]) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-f".into(),
        config.as_os_str().to_owned(),
        "--defaults-torrc".into(),
        defaults.as_os_str().to_owned(),
    ];
    args.extend(extra.iter().map(OsString::from));
    args
}
