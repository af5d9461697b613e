// tests/templating.rs

mod common;
use crate::common::init_tracing;
use crate::common::stub::{write_bundle, TEMPLATE_TEXT};

use std::error::Error;
use std::path::Path;

use relayvisor::errors::SupervisorError;
use relayvisor::fs::mock::MockFileSystem;
use relayvisor::fs::RealFileSystem;
use relayvisor::template::{materialize, Substitution};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn Error>>;

fn port_subs() -> Vec<Substitution> {
    vec![
        Substitution::new("127.0.0.1:80", "10.0.0.4:80"),
        Substitution::new("127.0.0.1:443", "10.0.0.4:443"),
    ]
}

const RENDERED: &str = "SocksPort 0\n\
HiddenServiceDir Data/hs0\n\
HiddenServicePort 80 10.0.0.4:80\n\
HiddenServicePort 443 10.0.0.4:443\n";

#[test]
fn distinct_output_is_identical_on_every_call() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    let template = Path::new("/bundle/Data/rotrc_IN_0");
    let output = Path::new("/bundle/Data/rotrc_0");
    fs.add_file(template, TEMPLATE_TEXT);

    materialize(&fs, template, &port_subs(), output)?;
    let first = fs.contents(output).expect("output written");
    materialize(&fs, template, &port_subs(), output)?;
    let second = fs.contents(output).expect("output written");

    assert_eq!(first, second);
    assert_eq!(String::from_utf8(first)?, RENDERED);
    // The template itself is never written.
    assert_eq!(fs.contents(template).as_deref(), Some(TEMPLATE_TEXT.as_bytes()));
    assert_eq!(fs.writes(), vec![output.to_path_buf(), output.to_path_buf()]);
    Ok(())
}

#[test]
fn in_place_second_call_changes_nothing() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    let template = Path::new("/bundle/Data/rotrc_IN_1");
    fs.add_file(template, TEMPLATE_TEXT);

    materialize(&fs, template, &port_subs(), template)?;
    let after_first = fs.contents(template).expect("template present");
    assert_eq!(String::from_utf8(after_first.clone())?, RENDERED);

    // New values have no effect once the placeholders are gone.
    let other = vec![
        Substitution::new("127.0.0.1:80", "192.168.1.1:80"),
        Substitution::new("127.0.0.1:443", "192.168.1.1:443"),
    ];
    materialize(&fs, template, &other, template)?;
    assert_eq!(fs.contents(template), Some(after_first));
    Ok(())
}

#[test]
fn missing_template_is_a_configuration_error() {
    let fs = MockFileSystem::new();
    let result = materialize(
        &fs,
        Path::new("/bundle/Data/rotrc_IN_9"),
        &port_subs(),
        Path::new("/bundle/Data/rotrc_9"),
    );

    match result {
        Err(SupervisorError::Configuration(msg)) => assert!(msg.contains("does not exist")),
        other => panic!("Expected Configuration error, got: {:?}", other),
    }
    assert!(fs.writes().is_empty());
}

#[test]
fn empty_value_is_rejected_before_anything_is_written() {
    let fs = MockFileSystem::new();
    let template = Path::new("/bundle/Data/rotrc_IN_0");
    fs.add_file(template, TEMPLATE_TEXT);

    let subs = vec![
        Substitution::new("127.0.0.1:80", "10.0.0.4:80"),
        Substitution::new("127.0.0.1:443", "  "),
    ];
    let result = materialize(&fs, template, &subs, Path::new("/bundle/Data/rotrc_0"));

    match result {
        Err(SupervisorError::Configuration(msg)) => assert!(msg.contains("127.0.0.1:443")),
        other => panic!("Expected Configuration error, got: {:?}", other),
    }
    assert!(fs.writes().is_empty());
}

#[test]
fn real_filesystem_writes_rendered_config() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    let template = write_bundle(dir.path(), 2);
    let output = dir.path().join("Data").join("out").join("rotrc_2");

    let written = materialize(&RealFileSystem, &template, &port_subs(), &output)?;

    assert_eq!(written, output);
    assert_eq!(std::fs::read_to_string(&output)?, RENDERED);
    assert_eq!(std::fs::read_to_string(&template)?, TEMPLATE_TEXT);
    Ok(())
}
