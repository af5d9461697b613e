// tests/cli_args.rs

use clap::Parser;
use relayvisor::cli::{CliArgs, LogLevel};

#[test]
fn defaults_to_relayvisor_toml() {
    let args = CliArgs::try_parse_from(["relayvisor"]).unwrap();
    assert_eq!(args.config, "Relayvisor.toml");
    assert!(args.log_level.is_none());
    assert!(!args.dry_run);
    assert!(!args.sweep);
}

#[test]
fn parses_all_flags() {
    let args = CliArgs::try_parse_from([
        "relayvisor",
        "--config",
        "/etc/relayvisor/relay.toml",
        "--log-level",
        "debug",
        "--dry-run",
    ])
    .unwrap();

    assert_eq!(args.config, "/etc/relayvisor/relay.toml");
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    assert!(args.dry_run);
}

#[test]
fn sweep_conflicts_with_dry_run() {
    assert!(CliArgs::try_parse_from(["relayvisor", "--sweep", "--dry-run"]).is_err());
    assert!(CliArgs::try_parse_from(["relayvisor", "--sweep"]).unwrap().sweep);
}
