// src/host/mod.rs

//! The hosting platform as seen by the supervisor.
//!
//! The platform owns configuration retrieval and instance numbering. The
//! supervisor only needs to read named settings and learn which instance it
//! is, so that is all [`HostEnvironment`] exposes. [`ConfigHost`] is the
//! implementation used by the binary: values come from the `[host]` section
//! of the config file, overridable through environment variables.

pub mod instance;

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::HostSection;

pub use instance::{current_instance_index, parse_instance_index};

/// Environment variable overriding the instance identifier.
pub const INSTANCE_ID_ENV: &str = "RELAYVISOR_INSTANCE_ID";

/// Prefix of environment variables overriding individual settings.
pub const SETTING_ENV_PREFIX: &str = "RELAYVISOR_SETTING_";

pub trait HostEnvironment: Send + Sync {
    /// Value of a named platform setting, if defined.
    fn config_value(&self, name: &str) -> Option<String>;

    /// Identifier of this instance among its peers, e.g. `"relay_IN_3"`.
    fn instance_id(&self) -> String;
}

/// Host backed by the `[host]` config section and the process environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigHost {
    instance_id: Option<String>,
    settings: BTreeMap<String, String>,
    read_env: bool,
}

impl ConfigHost {
    pub fn from_section(section: &HostSection) -> Self {
        Self {
            instance_id: section.instance_id.clone(),
            settings: section.settings.clone(),
            read_env: true,
        }
    }

    /// Host with fixed values and no environment lookups.
    pub fn fixed(instance_id: impl Into<String>, settings: BTreeMap<String, String>) -> Self {
        Self {
            instance_id: Some(instance_id.into()),
            settings,
            read_env: false,
        }
    }

    fn env(&self, key: &str) -> Option<String> {
        if !self.read_env {
            return None;
        }
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

impl HostEnvironment for ConfigHost {
    fn config_value(&self, name: &str) -> Option<String> {
        if let Some(v) = self.env(&format!("{SETTING_ENV_PREFIX}{name}")) {
            debug!(setting = %name, "setting taken from environment");
            return Some(v);
        }
        self.settings.get(name).cloned()
    }

    fn instance_id(&self) -> String {
        self.env(INSTANCE_ID_ENV)
            .or_else(|| self.instance_id.clone())
            .unwrap_or_default()
    }
}
