// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Placeholder expanded to the instance index in path templates.
pub const INDEX_PLACEHOLDER: &str = "{index}";

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [supervisor]
/// base_dir = "/opt/relay"
/// executable = "Rot/rot"
/// template = "Data/rotrc_IN_{index}"
/// fatal_patterns = ["Out of memory", "Dying"]
///
/// [[substitution]]
/// placeholder = "127.0.0.1:80"
/// setting = "HiddenServicePortDests"
///
/// [host]
/// instance_id = "relay_IN_0"
///
/// [host.settings]
/// HiddenServicePortDests = "10.0.0.4:80"
/// ```
///
/// All sections are optional and have defaults matching the relay bundle
/// layout.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub supervisor: SupervisorSection,

    /// Ordered placeholder → host setting pairs.
    #[serde(default = "default_substitutions")]
    pub substitution: Vec<SubstitutionSection>,

    #[serde(default)]
    pub host: HostSection,
}

impl Default for RawConfigFile {
    fn default() -> Self {
        Self {
            supervisor: SupervisorSection::default(),
            substitution: default_substitutions(),
            host: HostSection::default(),
        }
    }
}

/// `[supervisor]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorSection {
    /// Working directory of the relay; every other path is relative to it.
    /// A relative `base_dir` is resolved against the config file's directory.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    #[serde(default = "default_executable")]
    pub executable: PathBuf,

    /// Name used by the stale-instance sweep. Defaults to the executable's
    /// file stem.
    #[serde(default)]
    pub process_name: Option<String>,

    /// Config template; `{index}` expands to the instance index.
    #[serde(default = "default_template")]
    pub template: String,

    /// Where the rendered config is written. Ignored when `in_place = true`.
    #[serde(default = "default_output")]
    pub output: String,

    /// Overwrite the template itself instead of writing `output`.
    ///
    /// Once the placeholders are gone, later runs render nothing new, so
    /// the template must be restored before every launch in this mode.
    #[serde(default)]
    pub in_place: bool,

    #[serde(default = "default_defaults")]
    pub defaults: String,

    /// Extra arguments appended after `-f <config> --defaults-torrc <defaults>`.
    #[serde(default)]
    pub extra_args: Vec<String>,

    #[serde(default = "default_health_interval")]
    pub health_interval: String,

    #[serde(default = "default_kill_poll_interval")]
    pub kill_poll_interval: String,

    /// In-band tag the relay uses to print error lines on stdout.
    #[serde(default = "default_error_marker")]
    pub error_marker: String,

    /// Substrings that make an error line fatal. Case-sensitive.
    #[serde(default = "default_fatal_patterns")]
    pub fatal_patterns: Vec<String>,

    /// Raise the relay's scheduling priority one step after spawn.
    #[serde(default = "default_true")]
    pub raise_priority: bool,

    /// Delete generated hidden-service keys before launch.
    ///
    /// Unset means: on for debug builds, off for release builds, so a debug
    /// run never publishes the production identity.
    #[serde(default)]
    pub cleanup_stale_keys: Option<bool>,

    #[serde(default = "default_stale_key_dirs")]
    pub stale_key_dirs: Vec<String>,
}

impl Default for SupervisorSection {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            executable: default_executable(),
            process_name: None,
            template: default_template(),
            output: default_output(),
            in_place: false,
            defaults: default_defaults(),
            extra_args: Vec::new(),
            health_interval: default_health_interval(),
            kill_poll_interval: default_kill_poll_interval(),
            error_marker: default_error_marker(),
            fatal_patterns: default_fatal_patterns(),
            raise_priority: true,
            cleanup_stale_keys: None,
            stale_key_dirs: default_stale_key_dirs(),
        }
    }
}

/// `[[substitution]]` entry: replace `placeholder` with the value of the
/// host setting named `setting`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SubstitutionSection {
    pub placeholder: String,
    pub setting: String,
}

/// `[host]` section: the file-backed stand-in for the hosting platform.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct HostSection {
    #[serde(default)]
    pub instance_id: Option<String>,

    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_executable() -> PathBuf {
    PathBuf::from("Rot/rot")
}

fn default_template() -> String {
    "Data/rotrc_IN_{index}".to_string()
}

fn default_output() -> String {
    "Data/rotrc_{index}".to_string()
}

fn default_defaults() -> String {
    "Data/rotrc-defaults".to_string()
}

fn default_health_interval() -> String {
    "30s".to_string()
}

fn default_kill_poll_interval() -> String {
    "200ms".to_string()
}

fn default_error_marker() -> String {
    "[err]".to_string()
}

fn default_fatal_patterns() -> Vec<String> {
    vec!["Out of memory".to_string(), "Dying".to_string()]
}

fn default_stale_key_dirs() -> Vec<String> {
    vec![
        "Data/hs0".to_string(),
        "Data/hs1".to_string(),
        "Data/hs2".to_string(),
    ]
}

fn default_substitutions() -> Vec<SubstitutionSection> {
    vec![
        SubstitutionSection {
            placeholder: "127.0.0.1:80".to_string(),
            setting: "HiddenServicePortDests".to_string(),
        },
        SubstitutionSection {
            placeholder: "127.0.0.1:443".to_string(),
            setting: "HiddenServiceSSLPortDests".to_string(),
        },
    ]
}

fn default_true() -> bool {
    true
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub supervisor: SupervisorSettings,
    pub host: HostSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(supervisor: SupervisorSettings, host: HostSection) -> Self {
        Self { supervisor, host }
    }
}

/// A substitution whose value is looked up from the host at launch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionSpec {
    pub placeholder: String,
    pub setting: String,
}

/// Runtime settings for one supervisor, with durations parsed and the
/// effective process name and stale-key policy decided.
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub base_dir: PathBuf,
    pub executable: PathBuf,
    pub process_name: String,
    pub template: String,
    /// `None` means materialize in place.
    pub output: Option<String>,
    pub defaults: String,
    pub extra_args: Vec<String>,
    pub health_interval: Duration,
    pub kill_poll_interval: Duration,
    pub error_marker: String,
    pub fatal_patterns: Vec<String>,
    pub raise_priority: bool,
    pub cleanup_stale_keys: bool,
    pub stale_key_dirs: Vec<String>,
    pub substitutions: Vec<SubstitutionSpec>,
}

impl SupervisorSettings {
    pub fn executable_path(&self) -> PathBuf {
        self.base_dir.join(&self.executable)
    }

    pub fn template_path(&self, index: usize) -> PathBuf {
        self.base_dir.join(expand_index(&self.template, index))
    }

    /// Materialized config path; equals the template path in place mode.
    pub fn output_path(&self, index: usize) -> PathBuf {
        match &self.output {
            Some(output) => self.base_dir.join(expand_index(output, index)),
            None => self.template_path(index),
        }
    }

    pub fn defaults_path(&self) -> PathBuf {
        self.base_dir.join(&self.defaults)
    }

    pub fn stale_key_dirs(&self) -> Vec<PathBuf> {
        self.stale_key_dirs
            .iter()
            .map(|d| self.base_dir.join(d))
            .collect()
    }

    pub fn is_in_place(&self) -> bool {
        self.output.is_none()
    }
}

/// Replace every `{index}` in `template` with `index`.
pub fn expand_index(template: &str, index: usize) -> String {
    template.replace(INDEX_PLACEHOLDER, &index.to_string())
}

/// Default process name for the sweep: the executable's file stem.
pub(crate) fn process_name_from_executable(executable: &Path) -> Option<String> {
    executable
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}
