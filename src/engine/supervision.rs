// src/engine/supervision.rs

use std::io;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::SupervisorSettings;
use crate::errors::{Result, SupervisorError};
use crate::fs::FileSystem;
use crate::host::{current_instance_index, HostEnvironment};
use crate::supervisor::{try_kill_stale_instances, ConfigDescriptor, ProcessSupervisor};
use crate::types::LoopExit;

/// Run one relay for this host instance until it becomes unhealthy or
/// `cancel` fires.
///
/// Order of operations:
/// 1. resolve the instance index,
/// 2. sweep stale relay processes,
/// 3. resolve the config descriptor, build and launch a supervisor,
/// 4. poll health every `health_interval`, waking early on cancellation,
/// 5. shut the supervisor down (on every path once it exists),
/// 6. sweep again.
///
/// Configuration and launch errors are returned after teardown.
pub async fn run_supervision(
    host: &dyn HostEnvironment,
    fs: &dyn FileSystem,
    settings: &SupervisorSettings,
    cancel: &CancellationToken,
) -> Result<LoopExit> {
    let index = current_instance_index(host);

    try_kill_stale_instances(&settings.process_name);

    let result = supervise_instance(host, fs, settings, index, cancel).await;

    try_kill_stale_instances(&settings.process_name);

    result
}

async fn supervise_instance(
    host: &dyn HostEnvironment,
    fs: &dyn FileSystem,
    settings: &SupervisorSettings,
    index: usize,
    cancel: &CancellationToken,
) -> Result<LoopExit> {
    let descriptor = ConfigDescriptor::resolve(settings, host, index)?;
    let supervisor = ProcessSupervisor::new(settings.clone());

    let result = poll_health(&supervisor, fs, &descriptor, settings, cancel).await;

    supervisor.shutdown().await;

    result
}

async fn poll_health(
    supervisor: &ProcessSupervisor,
    fs: &dyn FileSystem,
    descriptor: &ConfigDescriptor,
    settings: &SupervisorSettings,
    cancel: &CancellationToken,
) -> Result<LoopExit> {
    supervisor.launch(fs, descriptor)?;
    info!(
        index = descriptor.instance_index,
        pid = ?supervisor.pid(),
        interval = ?settings.health_interval,
        "relay supervision started"
    );

    loop {
        if cancel.is_cancelled() {
            return Ok(LoopExit::Cancelled);
        }
        if !supervisor.is_healthy() {
            return Ok(LoopExit::Unhealthy);
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                info!("cancellation requested; stopping relay supervision");
                return Ok(LoopExit::Cancelled);
            }
            _ = tokio::time::sleep(settings.health_interval) => {}
        }
    }
}

/// Outer wrapper: run [`run_supervision`] and turn every outcome into a
/// clean stop.
///
/// Errors are logged, not returned. An out-of-memory error cancels `cancel`
/// so the whole host winds down instead of retrying.
pub async fn run_until_cancelled(
    host: &dyn HostEnvironment,
    fs: &dyn FileSystem,
    settings: &SupervisorSettings,
    cancel: &CancellationToken,
) -> LoopExit {
    if cancel.is_cancelled() {
        info!("cancelled before relay supervision started");
        return LoopExit::Cancelled;
    }

    match run_supervision(host, fs, settings, cancel).await {
        Ok(exit) => {
            info!(?exit, "relay supervision ended");
            exit
        }
        Err(err) => {
            error!(error = %err, "relay supervision failed");
            if is_out_of_memory(&err) {
                error!("out of memory; cancelling host");
                cancel.cancel();
            }
            if cancel.is_cancelled() {
                LoopExit::Cancelled
            } else {
                LoopExit::Unhealthy
            }
        }
    }
}

fn is_out_of_memory(err: &SupervisorError) -> bool {
    match err {
        SupervisorError::Launch { source, .. } | SupervisorError::Teardown { source, .. } => {
            source.kind() == io::ErrorKind::OutOfMemory
        }
        _ => false,
    }
}
