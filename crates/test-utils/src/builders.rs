#![allow(dead_code)]

use std::path::{Path, PathBuf};

use relayvisor::config::{ConfigFile, RawConfigFile, SubstitutionSection, SupervisorSettings};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the defaults with a short health interval, a fast kill poll,
/// priority raising and key cleanup off, and no substitutions.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        let mut config = RawConfigFile::default();
        config.supervisor.base_dir = base_dir.as_ref().to_path_buf();
        config.supervisor.health_interval = "50ms".to_string();
        config.supervisor.kill_poll_interval = "20ms".to_string();
        config.supervisor.raise_priority = false;
        config.supervisor.cleanup_stale_keys = Some(false);
        config.substitution.clear();
        Self { config }
    }

    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.supervisor.executable = path.into();
        self
    }

    pub fn process_name(mut self, name: &str) -> Self {
        self.config.supervisor.process_name = Some(name.to_string());
        self
    }

    pub fn template(mut self, template: &str) -> Self {
        self.config.supervisor.template = template.to_string();
        self
    }

    pub fn output(mut self, output: &str) -> Self {
        self.config.supervisor.output = output.to_string();
        self
    }

    pub fn in_place(mut self, val: bool) -> Self {
        self.config.supervisor.in_place = val;
        self
    }

    pub fn defaults(mut self, defaults: &str) -> Self {
        self.config.supervisor.defaults = defaults.to_string();
        self
    }

    pub fn health_interval(mut self, dur: &str) -> Self {
        self.config.supervisor.health_interval = dur.to_string();
        self
    }

    pub fn kill_poll_interval(mut self, dur: &str) -> Self {
        self.config.supervisor.kill_poll_interval = dur.to_string();
        self
    }

    pub fn error_marker(mut self, marker: &str) -> Self {
        self.config.supervisor.error_marker = marker.to_string();
        self
    }

    pub fn fatal_patterns(mut self, patterns: &[&str]) -> Self {
        self.config.supervisor.fatal_patterns = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn raise_priority(mut self, val: bool) -> Self {
        self.config.supervisor.raise_priority = val;
        self
    }

    pub fn cleanup_stale_keys(mut self, val: bool) -> Self {
        self.config.supervisor.cleanup_stale_keys = Some(val);
        self
    }

    pub fn stale_key_dirs(mut self, dirs: &[&str]) -> Self {
        self.config.supervisor.stale_key_dirs = dirs.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn substitution(mut self, placeholder: &str, setting: &str) -> Self {
        self.config.substitution.push(SubstitutionSection {
            placeholder: placeholder.to_string(),
            setting: setting.to_string(),
        });
        self
    }

    pub fn instance_id(mut self, id: &str) -> Self {
        self.config.host.instance_id = Some(id.to_string());
        self
    }

    pub fn host_setting(mut self, name: &str, value: &str) -> Self {
        self.config
            .host
            .settings
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    pub fn build_settings(self) -> SupervisorSettings {
        self.build().supervisor
    }
}
