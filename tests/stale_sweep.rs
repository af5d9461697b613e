// tests/stale_sweep.rs

#![cfg(target_os = "linux")]

mod common;
use crate::common::init_tracing;
use crate::common::stub::write_stub_relay;

use std::error::Error;
use std::os::unix::process::ExitStatusExt;
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use relayvisor::supervisor::{find_stale_instances, try_kill, try_kill_stale_instances};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn sweep_kills_leftover_instances_by_name() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    let name = format!("stale{}", std::process::id());
    let script = write_stub_relay(dir.path(), &name, "while true; do sleep 1; done");

    let mut child = Command::new(&script).spawn()?;
    let pid = child.id();

    let deadline = Instant::now() + Duration::from_secs(5);
    let found = loop {
        let found = find_stale_instances(&name);
        if found.iter().any(|p| p.pid == pid) || Instant::now() > deadline {
            break found;
        }
        thread::sleep(Duration::from_millis(20));
    };
    assert!(
        found.iter().any(|p| p.pid == pid),
        "stub relay {pid} not found in {found:?}"
    );

    assert!(try_kill_stale_instances(&name) >= 1);

    let status = child.wait()?;
    assert_eq!(status.signal(), Some(9));
    Ok(())
}

#[test]
fn sweep_ignores_the_current_process() {
    let own = std::process::id();
    let exe = std::env::current_exe().expect("current exe");
    let stem = exe
        .file_stem()
        .and_then(|s| s.to_str())
        .expect("exe stem")
        .to_string();

    assert!(find_stale_instances(&stem).iter().all(|p| p.pid != own));
}

#[test]
fn unknown_name_finds_nothing_and_kill_of_a_gone_pid_fails() -> TestResult {
    let name = format!("nothing-runs-as-this-{}", std::process::id());
    assert!(find_stale_instances(&name).is_empty());
    assert_eq!(try_kill_stale_instances(&name), 0);

    let mut child = Command::new("true").spawn()?;
    let pid = child.id();
    child.wait()?;
    assert!(!try_kill(pid));
    Ok(())
}
