// tests/instance_index.rs

mod common;
use crate::common::builders::ConfigFileBuilder;
use crate::common::init_tracing;

use std::collections::BTreeMap;
use std::error::Error;

use relayvisor::errors::SupervisorError;
use relayvisor::host::{current_instance_index, ConfigHost, HostEnvironment};
use relayvisor::supervisor::ConfigDescriptor;
use relayvisor::template::Substitution;

type TestResult = Result<(), Box<dyn Error>>;

fn host(id: &str, settings: &[(&str, &str)]) -> ConfigHost {
    let settings: BTreeMap<String, String> = settings
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ConfigHost::fixed(id, settings)
}

#[test]
fn index_comes_from_the_instance_identifier() {
    init_tracing();

    assert_eq!(current_instance_index(&host("role_3", &[])), 3);
    assert_eq!(current_instance_index(&host("role.7", &[])), 7);
    assert_eq!(current_instance_index(&host("role", &[])), 0);
}

#[test]
fn fixed_host_serves_its_settings() {
    let h = host("relay_IN_1", &[("HiddenServicePortDests", "10.0.0.4:80")]);

    assert_eq!(h.instance_id(), "relay_IN_1");
    assert_eq!(
        h.config_value("HiddenServicePortDests").as_deref(),
        Some("10.0.0.4:80")
    );
    assert_eq!(h.config_value("Unknown"), None);
}

#[test]
fn descriptor_resolves_paths_and_values() -> TestResult {
    init_tracing();

    let settings = ConfigFileBuilder::new("/opt/bundle")
        .substitution("127.0.0.1:80", "HiddenServicePortDests")
        .substitution("127.0.0.1:443", "HiddenServiceSSLPortDests")
        .build_settings();
    let h = host(
        "relay_IN_2",
        &[
            ("HiddenServicePortDests", "10.0.0.4:80"),
            ("HiddenServiceSSLPortDests", "10.0.0.4:443"),
        ],
    );

    let index = current_instance_index(&h);
    let descriptor = ConfigDescriptor::resolve(&settings, &h, index)?;

    assert_eq!(descriptor.instance_index, 2);
    assert_eq!(
        descriptor.template_path,
        settings.base_dir.join("Data/rotrc_IN_2")
    );
    assert_eq!(descriptor.output_path, settings.base_dir.join("Data/rotrc_2"));
    assert_eq!(
        descriptor.defaults_path,
        settings.base_dir.join("Data/rotrc-defaults")
    );
    assert!(!descriptor.is_in_place());
    assert_eq!(
        descriptor.substitutions,
        vec![
            Substitution::new("127.0.0.1:80", "10.0.0.4:80"),
            Substitution::new("127.0.0.1:443", "10.0.0.4:443"),
        ]
    );
    Ok(())
}

#[test]
fn descriptor_fails_on_missing_or_empty_setting() {
    let settings = ConfigFileBuilder::new("/opt/bundle")
        .substitution("127.0.0.1:80", "HiddenServicePortDests")
        .substitution("127.0.0.1:443", "HiddenServiceSSLPortDests")
        .build_settings();

    let missing = host("relay_IN_0", &[("HiddenServicePortDests", "10.0.0.4:80")]);
    match ConfigDescriptor::resolve(&settings, &missing, 0) {
        Err(SupervisorError::Configuration(msg)) => {
            assert!(msg.contains("HiddenServiceSSLPortDests"))
        }
        other => panic!("Expected Configuration error, got: {:?}", other),
    }

    let empty = host(
        "relay_IN_0",
        &[
            ("HiddenServicePortDests", ""),
            ("HiddenServiceSSLPortDests", "10.0.0.4:443"),
        ],
    );
    match ConfigDescriptor::resolve(&settings, &empty, 0) {
        Err(SupervisorError::Configuration(msg)) => {
            assert!(msg.contains("HiddenServicePortDests"))
        }
        other => panic!("Expected Configuration error, got: {:?}", other),
    }
}

#[test]
fn in_place_descriptor_targets_the_template() -> TestResult {
    let settings = ConfigFileBuilder::new("/opt/bundle")
        .in_place(true)
        .build_settings();

    let descriptor = ConfigDescriptor::resolve(&settings, &host("relay_IN_4", &[]), 4)?;

    assert!(descriptor.is_in_place());
    assert_eq!(descriptor.output_path, descriptor.template_path);
    Ok(())
}
