//! Error types for sheetload-core

use thiserror::Error;

/// Result type alias using [`ManifestError`]
pub type Result<T> = std::result::Result<T, ManifestError>;

/// Reasons a resource manifest is rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
    /// The manifest lists no resources
    #[error("Manifest contains no resources")]
    Empty,

    /// The first resource must be loadable without prerequisites
    #[error("First resource '{0}' must not declare dependencies")]
    FirstHasDependencies(String),

    /// Two resources share a name
    #[error("Duplicate resource name: {0}")]
    DuplicateName(String),

    /// A dependency names a resource that is not in the manifest
    #[error("Resource '{resource}' depends on unknown resource '{dependency}'")]
    UnknownDependency {
        resource: String,
        dependency: String,
    },

    /// A resource lists itself as a dependency
    #[error("Resource '{0}' depends on itself")]
    SelfDependency(String),

    /// The dependency graph contains a cycle through the named resource
    #[error("Dependency cycle detected involving resource '{0}'")]
    Cycle(String),

    /// Resource paths are suffixes appended to the base URL
    #[error("Path for resource '{resource}' must start with '/': {path}")]
    InvalidPath { resource: String, path: String },

    /// Manifest JSON could not be parsed
    #[error("Manifest parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ManifestError {
    fn from(e: serde_json::Error) -> Self {
        ManifestError::Parse(e.to_string())
    }
}
