// src/config/validate.rs

use std::collections::HashSet;
use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{
    process_name_from_executable, ConfigFile, RawConfigFile, SubstitutionSpec,
    SupervisorSettings,
};
use crate::errors::{Result, SupervisorError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::SupervisorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let supervisor = validate_supervisor(&raw)?;
        Ok(ConfigFile::new_unchecked(supervisor, raw.host))
    }
}

fn validate_supervisor(raw: &RawConfigFile) -> Result<SupervisorSettings> {
    let sup = &raw.supervisor;

    if sup.executable.as_os_str().is_empty() {
        return Err(SupervisorError::config(
            "[supervisor].executable must not be empty",
        ));
    }

    let process_name = match &sup.process_name {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        Some(_) => {
            return Err(SupervisorError::config(
                "[supervisor].process_name must not be empty",
            ));
        }
        None => process_name_from_executable(&sup.executable).ok_or_else(|| {
            SupervisorError::config(format!(
                "cannot derive a process name from executable {:?}; set [supervisor].process_name",
                sup.executable
            ))
        })?,
    };

    if sup.template.trim().is_empty() {
        return Err(SupervisorError::config(
            "[supervisor].template must not be empty",
        ));
    }

    let output = if sup.in_place {
        None
    } else {
        if sup.output.trim().is_empty() {
            return Err(SupervisorError::config(
                "[supervisor].output must not be empty unless in_place = true",
            ));
        }
        if sup.output == sup.template {
            return Err(SupervisorError::config(
                "[supervisor].output equals the template; set in_place = true to overwrite the template",
            ));
        }
        Some(sup.output.clone())
    };

    let health_interval = positive_duration("health_interval", &sup.health_interval)?;
    let kill_poll_interval = positive_duration("kill_poll_interval", &sup.kill_poll_interval)?;

    // An empty marker or pattern would match every line.
    if sup.error_marker.is_empty() {
        return Err(SupervisorError::config(
            "[supervisor].error_marker must not be empty",
        ));
    }
    if sup.fatal_patterns.iter().any(|p| p.is_empty()) {
        return Err(SupervisorError::config(
            "[supervisor].fatal_patterns must not contain empty strings",
        ));
    }

    let substitutions = validate_substitutions(raw)?;

    Ok(SupervisorSettings {
        base_dir: sup.base_dir.clone(),
        executable: sup.executable.clone(),
        process_name,
        template: sup.template.clone(),
        output,
        defaults: sup.defaults.clone(),
        extra_args: sup.extra_args.clone(),
        health_interval,
        kill_poll_interval,
        error_marker: sup.error_marker.clone(),
        fatal_patterns: sup.fatal_patterns.clone(),
        raise_priority: sup.raise_priority,
        cleanup_stale_keys: sup.cleanup_stale_keys.unwrap_or(cfg!(debug_assertions)),
        stale_key_dirs: sup.stale_key_dirs.clone(),
        substitutions,
    })
}

fn positive_duration(field: &str, value: &str) -> Result<Duration> {
    let dur = parse_duration(value).map_err(|e| {
        SupervisorError::config(format!("[supervisor].{field} = {value:?}: {e}"))
    })?;
    if dur.is_zero() {
        return Err(SupervisorError::config(format!(
            "[supervisor].{field} must be greater than zero"
        )));
    }
    Ok(dur)
}

fn validate_substitutions(raw: &RawConfigFile) -> Result<Vec<SubstitutionSpec>> {
    let mut seen = HashSet::new();
    let mut specs = Vec::with_capacity(raw.substitution.len());

    for (i, sub) in raw.substitution.iter().enumerate() {
        if sub.placeholder.is_empty() {
            return Err(SupervisorError::config(format!(
                "substitution #{i} has an empty placeholder"
            )));
        }
        if sub.setting.trim().is_empty() {
            return Err(SupervisorError::config(format!(
                "substitution '{}' has an empty setting name",
                sub.placeholder
            )));
        }
        if !seen.insert(sub.placeholder.as_str()) {
            return Err(SupervisorError::config(format!(
                "placeholder '{}' is listed more than once",
                sub.placeholder
            )));
        }
        specs.push(SubstitutionSpec {
            placeholder: sub.placeholder.clone(),
            setting: sub.setting.trim().to_string(),
        });
    }

    Ok(specs)
}
