// src/errors.rs

//! Crate-wide error type and aliases.
//!
//! The variants follow how each failure is handled:
//! - `Configuration` is fatal to building a supervisor and propagates.
//! - `Launch` propagates to the caller of `launch`, which must turn it into
//!   a clean stop rather than a crash.
//! - `Teardown` is only ever logged; shutdown never fails its caller.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Launch error for {executable:?}: {source}")]
    Launch {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Teardown error during {operation}: {source}")]
    Teardown {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SupervisorError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        SupervisorError::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
