//! Per-resource and per-run load state

use std::fmt;

use serde::{Deserialize, Serialize};

/// Progress of a single resource within one run.
///
/// States only move forward: `NotStarted -> Loading -> Loaded | Error`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    #[default]
    NotStarted,
    Loading,
    Loaded,
    Error,
}

impl ResourceState {
    /// Loaded or Error
    pub fn is_terminal(self) -> bool {
        matches!(self, ResourceState::Loaded | ResourceState::Error)
    }

    /// Whether moving from `self` to `next` respects the forward-only progression
    pub fn can_transition_to(self, next: ResourceState) -> bool {
        matches!(
            (self, next),
            (ResourceState::NotStarted, ResourceState::Loading)
                | (ResourceState::Loading, ResourceState::Loaded)
                | (ResourceState::Loading, ResourceState::Error)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceState::NotStarted => "not_started",
            ResourceState::Loading => "loading",
            ResourceState::Loaded => "loaded",
            ResourceState::Error => "error",
        }
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Progress of a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

impl RunState {
    pub fn is_finished(self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }
}

/// A failure recorded against a resource during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub resource: String,
    pub cause: String,
}

impl ErrorRecord {
    pub fn new(resource: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            cause: cause.into(),
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.resource, self.cause)
    }
}
