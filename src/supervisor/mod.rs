// src/supervisor/mod.rs

//! Relay process supervision.
//!
//! - [`process_supervisor`] owns one relay process: launch, output
//!   handling, health checks and teardown.
//! - [`classify`] decides what each output line means.
//! - [`process`] is the process handle seam and the spawn routine.
//! - [`descriptor`] resolves the per-instance config inputs.
//! - [`artifacts`] removes generated identity files before launch.
//! - [`stale`] finds and kills relay processes left by a previous run.
//! - [`priority`] raises the relay's scheduling priority.

pub mod artifacts;
pub mod classify;
pub mod descriptor;
pub mod priority;
pub mod process;
pub mod process_supervisor;
pub mod stale;

pub use classify::{FatalPatterns, LineClassifier, OutputEvent};
pub use descriptor::ConfigDescriptor;
pub use process::{ChildProcess, LaunchSpec, ProcessHandle};
pub use process_supervisor::{relay_args, ProcessSupervisor, SupervisorState};
pub use stale::{find_stale_instances, try_kill, try_kill_stale_instances, StaleProcess};
