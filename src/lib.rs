// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod host;
pub mod logging;
pub mod supervisor;
pub mod template;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::RelayHost;
use crate::fs::{FileSystem, RealFileSystem};
use crate::host::{current_instance_index, ConfigHost, HostEnvironment};
use crate::supervisor::{relay_args, try_kill_stale_instances, ConfigDescriptor};
use crate::template::render;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the file-backed host collaborator
/// - the relay host lifecycle (start, run, stop)
/// - Ctrl-C / SIGTERM handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.sweep {
        let killed = try_kill_stale_instances(&cfg.supervisor.process_name);
        println!("killed {killed} stale '{}' process(es)", cfg.supervisor.process_name);
        return Ok(());
    }

    let host: Arc<dyn HostEnvironment> = Arc::new(ConfigHost::from_section(&cfg.host));
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    if args.dry_run {
        print_dry_run(&cfg, host.as_ref(), fs.as_ref())?;
        return Ok(());
    }

    let relay_host = Arc::new(RelayHost::new(host, fs, cfg.supervisor.clone()));
    relay_host.on_start();

    // Stop request → cancel and wait for the run to finish.
    {
        let relay_host = Arc::clone(&relay_host);
        tokio::spawn(async move {
            if let Err(e) = shutdown_signal().await {
                warn!(error = %e, "failed to listen for stop signals");
                return;
            }
            relay_host.on_stop().await;
        });
    }

    let exit = relay_host.run().await;
    info!(?exit, "relayvisor exiting");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res?,
            _ = term.recv() => {}
        }
        info!("stop signal received");
        Ok(())
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("stop signal received");
        Ok(())
    }
}

/// Print the resolved launch plan and the rendered relay config without
/// writing or spawning anything.
fn print_dry_run(cfg: &ConfigFile, host: &dyn HostEnvironment, fs: &dyn FileSystem) -> Result<()> {
    let settings = &cfg.supervisor;
    let index = current_instance_index(host);
    let descriptor = ConfigDescriptor::resolve(settings, host, index)?;

    println!("relayvisor dry-run");
    println!("  instance index    = {index}");
    println!("  base_dir          = {}", settings.base_dir.display());
    println!("  executable        = {}", settings.executable_path().display());
    println!("  process_name      = {}", settings.process_name);
    println!("  template          = {}", descriptor.template_path.display());
    println!("  output            = {}", descriptor.output_path.display());
    if descriptor.is_in_place() {
        println!("                      (in place: the template will be overwritten)");
    }
    println!("  health_interval   = {:?}", settings.health_interval);
    println!("  kill_poll         = {:?}", settings.kill_poll_interval);
    println!("  error_marker      = {:?}", settings.error_marker);
    println!("  fatal_patterns    = {:?}", settings.fatal_patterns);
    println!("  raise_priority    = {}", settings.raise_priority);
    println!("  cleanup_stale_keys= {}", settings.cleanup_stale_keys);
    println!(
        "  args              = {:?}",
        relay_args(&descriptor.output_path, &descriptor.defaults_path, &settings.extra_args)
    );
    println!();

    let template = fs.read_to_string(&descriptor.template_path)?;
    println!("rendered config:");
    print!("{}", render(&template, &descriptor.substitutions));

    debug!("dry-run complete (nothing written or spawned)");
    Ok(())
}
