// src/engine/host.rs

use std::any::Any;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::SupervisorSettings;
use crate::fs::FileSystem;
use crate::host::HostEnvironment;
use crate::supervisor::try_kill_stale_instances;
use crate::types::LoopExit;

use super::supervision::run_until_cancelled;

/// Start/run/stop lifecycle around the supervision loop.
///
/// `run` is driven by the host's main task; `on_stop` may be called from
/// any other task and returns only after `run` has finished, so the relay
/// has been reaped by the time the host proceeds with its own shutdown.
pub struct RelayHost {
    host: Arc<dyn HostEnvironment>,
    fs: Arc<dyn FileSystem>,
    settings: SupervisorSettings,
    cancel: CancellationToken,
    run_complete: watch::Sender<bool>,
}

impl RelayHost {
    pub fn new(
        host: Arc<dyn HostEnvironment>,
        fs: Arc<dyn FileSystem>,
        settings: SupervisorSettings,
    ) -> Self {
        let (run_complete, _) = watch::channel(false);
        Self {
            host,
            fs,
            settings,
            cancel: CancellationToken::new(),
            run_complete,
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Install the panic hook. Call once, before `run`.
    pub fn on_start(&self) {
        install_panic_hook(self.cancel.clone());
        info!(process_name = %self.settings.process_name, "relay host started");
    }

    /// Sweep, supervise until cancelled or unhealthy, sweep again, then
    /// signal completion. Completion is signalled even if this future
    /// panics or is dropped.
    pub async fn run(&self) -> LoopExit {
        let _complete = CompletionGuard(&self.run_complete);
        info!("relay host is running");

        try_kill_stale_instances(&self.settings.process_name);

        let exit = run_until_cancelled(
            self.host.as_ref(),
            self.fs.as_ref(),
            &self.settings,
            &self.cancel,
        )
        .await;

        try_kill_stale_instances(&self.settings.process_name);

        info!(?exit, "relay host run finished");
        exit
    }

    /// Request cancellation and wait until `run` has completed.
    pub async fn on_stop(&self) {
        info!("relay host is stopping");
        self.cancel.cancel();

        let mut rx = self.run_complete.subscribe();
        // The sender lives in `self`, so this only ends once `run` is done.
        let _ = rx.wait_for(|done| *done).await;

        info!("relay host has stopped");
    }

    pub fn is_run_complete(&self) -> bool {
        *self.run_complete.borrow()
    }
}

struct CompletionGuard<'a>(&'a watch::Sender<bool>);

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(true);
    }
}

/// Log every panic, and cancel `cancel` when the panic reports memory
/// exhaustion. The previously installed hook still runs afterwards.
pub fn install_panic_hook(cancel: CancellationToken) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let message = panic_message(info.payload());
        let location = info.location().map(|l| l.to_string());
        error!(panic = %message, location = ?location, "unhandled panic");

        if is_out_of_memory_message(&message) {
            error!("out of memory reported by panic; cancelling host");
            cancel.cancel();
        }

        previous(info);
    }));
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "NULL".to_string()
    }
}

pub(crate) fn is_out_of_memory_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("out of memory")
        || lower.contains("memory allocation")
        || lower.contains("capacity overflow")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_out_of_memory_messages() {
        assert!(is_out_of_memory_message("Out of memory while growing buffer"));
        assert!(is_out_of_memory_message("memory allocation of 1024 bytes failed"));
        assert!(is_out_of_memory_message("capacity overflow"));
        assert!(!is_out_of_memory_message("index out of bounds"));
    }

    #[test]
    fn panic_payloads_are_rendered() {
        let s: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");
        let s: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(s.as_ref()), "owned");
        let s: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(s.as_ref()), "NULL");
    }
}
