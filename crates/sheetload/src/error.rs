//! Error types for a load run.

use std::fmt;
use std::time::Duration;

use sheetload_core::ManifestError;
use thiserror::Error;

/// Step of the post-load initialization sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitStep {
    Construct,
    RegisterPlugin(String),
    CreateUnit,
}

impl fmt::Display for InitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitStep::Construct => f.write_str("construct engine"),
            InitStep::RegisterPlugin(name) => write!(f, "register plugin '{name}'"),
            InitStep::CreateUnit => f.write_str("create default unit"),
        }
    }
}

/// The engine host rejected an initialization step
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to {step}: {cause}")]
pub struct InitError {
    pub step: InitStep,
    pub cause: String,
}

impl InitError {
    pub fn new(step: InitStep, cause: impl fmt::Display) -> Self {
        Self {
            step,
            cause: cause.to_string(),
        }
    }
}

/// Why a run ended in the Failed state
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Invalid manifest: {0}")]
    InvalidManifest(#[from] ManifestError),

    #[error("Failed to load resource '{resource}' from {url}: {cause}")]
    ScriptLoad {
        resource: String,
        url: String,
        cause: String,
    },

    /// A dependency settled in Error while `resource` was waiting on it.
    ///
    /// A run ends on the dependency's own [`RunError::ScriptLoad`] before any
    /// waiter observes it, so a run does not return this variant. Skipped
    /// dependents are reported as warning events instead.
    #[error("Resource '{resource}' skipped: dependency '{dependency}' failed to load")]
    Dependency {
        resource: String,
        dependency: String,
    },

    #[error("Resource '{resource}' gave up after {waited:?} waiting for dependency '{dependency}'")]
    DependencyTimeout {
        resource: String,
        dependency: String,
        waited: Duration,
    },

    #[error("Engine initialization failed: {0}")]
    Initialization(#[from] InitError),
}

impl RunError {
    /// Name of the resource the failure is attributed to, if any
    pub fn resource(&self) -> Option<&str> {
        match self {
            RunError::ScriptLoad { resource, .. }
            | RunError::Dependency { resource, .. }
            | RunError::DependencyTimeout { resource, .. } => Some(resource),
            RunError::InvalidManifest(_) | RunError::Initialization(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RunError>;
