//! # sheetload-core
//!
//! Core data structures for loading a bundled spreadsheet engine.
//!
//! This crate provides the runtime-independent types used throughout sheetload:
//! - [`ResourceDescriptor`] and [`Manifest`] - The named script bundles and their dependency graph
//! - [`ResourceState`] and [`RunState`] - Per-resource and per-run progress
//! - [`LoadEvent`] - Timestamped status events emitted on every state transition
//! - [`EngineConfig`], [`PluginSpec`] and [`WorkbookData`] - What the engine is initialized with
//!
//! ## Example
//!
//! ```rust
//! use sheetload_core::Manifest;
//!
//! let manifest = Manifest::default_bundles();
//! assert_eq!(manifest.first().name, "core");
//! assert_eq!(
//!     manifest.resolve_url("https://cdn.example.com/engine/", manifest.first()),
//!     "https://cdn.example.com/engine/core.js"
//! );
//! ```

pub mod error;
pub mod event;
pub mod manifest;
pub mod state;
pub mod workbook;

// Re-exports for convenience
pub use error::{ManifestError, Result};
pub use event::{EventLevel, LoadEvent};
pub use manifest::{Manifest, ResourceDescriptor};
pub use state::{ErrorRecord, ResourceState, RunState};
pub use workbook::{EngineConfig, PluginSpec, SheetData, UnitKind, WorkbookData};
