// src/supervisor/descriptor.rs

use std::path::PathBuf;

use crate::config::SupervisorSettings;
use crate::errors::{Result, SupervisorError};
use crate::host::HostEnvironment;
use crate::template::Substitution;

/// Everything needed to materialize one instance's relay config.
///
/// Resolved once before the supervisor is built and never changed after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDescriptor {
    pub instance_index: usize,
    pub template_path: PathBuf,
    pub substitutions: Vec<Substitution>,
    pub output_path: PathBuf,
    pub defaults_path: PathBuf,
}

impl ConfigDescriptor {
    /// Look up every substitution value from the host.
    ///
    /// A missing or empty setting is a configuration error.
    pub fn resolve(
        settings: &SupervisorSettings,
        host: &dyn HostEnvironment,
        instance_index: usize,
    ) -> Result<Self> {
        let substitutions = settings
            .substitutions
            .iter()
            .map(|spec| {
                let value = host
                    .config_value(&spec.setting)
                    .filter(|v| !v.trim().is_empty())
                    .ok_or_else(|| {
                        SupervisorError::config(format!(
                            "host setting '{}' (for placeholder '{}') is missing or empty",
                            spec.setting, spec.placeholder
                        ))
                    })?;
                Ok(Substitution::new(spec.placeholder.clone(), value))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            instance_index,
            template_path: settings.template_path(instance_index),
            substitutions,
            output_path: settings.output_path(instance_index),
            defaults_path: settings.defaults_path(),
        })
    }

    pub fn is_in_place(&self) -> bool {
        self.template_path == self.output_path
    }
}
