// src/engine/mod.rs

//! Host-facing orchestration.
//!
//! - [`supervision`] drives one supervisor: sweep, launch, poll health,
//!   tear down, sweep again.
//! - [`host`] is the outer start/run/stop lifecycle that owns the
//!   cancellation token and the completion signal the stop path waits on.

pub mod host;
pub mod supervision;

pub use host::{install_panic_hook, RelayHost};
pub use supervision::{run_supervision, run_until_cancelled};
pub use crate::types::LoopExit;
