//! Script loader backed by a local bundle directory.
//!
//! Stands in for a browser when checking a build output: a bundle "loads" if
//! it exists, is a regular file and is not empty.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use sheetload::ScriptLoader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsLoadError {
    #[error("bundle not found: {0}")]
    NotFound(PathBuf),

    #[error("not a regular file: {0}")]
    NotAFile(PathBuf),

    #[error("bundle is empty: {0}")]
    Empty(PathBuf),

    #[error("unsupported URL scheme (only local paths and file:// URLs): {0}")]
    UnsupportedScheme(String),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A bundle that was read successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedBundle {
    pub path: PathBuf,
    pub bytes: u64,
}

#[derive(Debug, Default)]
pub struct FsLoader {
    loaded: RefCell<Vec<LoadedBundle>>,
}

impl FsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundles read so far, in completion order
    pub fn loaded(&self) -> Vec<LoadedBundle> {
        self.loaded.borrow().clone()
    }

    pub fn total_bytes(&self) -> u64 {
        self.loaded.borrow().iter().map(|b| b.bytes).sum()
    }
}

/// Map a resource URL onto a filesystem path
pub fn url_to_path(url: &str) -> Result<PathBuf, FsLoadError> {
    if let Some(rest) = url.strip_prefix("file://") {
        return Ok(PathBuf::from(rest));
    }
    if url.contains("://") {
        return Err(FsLoadError::UnsupportedScheme(url.to_string()));
    }
    Ok(PathBuf::from(url))
}

async fn read_bundle(path: &Path) -> Result<u64, FsLoadError> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            FsLoadError::NotFound(path.to_path_buf())
        } else {
            FsLoadError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    if !metadata.is_file() {
        return Err(FsLoadError::NotAFile(path.to_path_buf()));
    }

    let contents = tokio::fs::read(path).await.map_err(|e| FsLoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    if contents.is_empty() {
        return Err(FsLoadError::Empty(path.to_path_buf()));
    }

    Ok(contents.len() as u64)
}

impl ScriptLoader for FsLoader {
    type Error = FsLoadError;

    async fn load(&self, url: &str) -> Result<(), FsLoadError> {
        let path = url_to_path(url)?;
        let bytes = read_bundle(&path).await?;
        tracing::debug!("Read {} bytes from {}", bytes, path.display());
        self.loaded.borrow_mut().push(LoadedBundle { path, bytes });
        Ok(())
    }
}
