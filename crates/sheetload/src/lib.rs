//! Dependency-ordered loading of a bundled spreadsheet engine.
//!
//! The engine ships as a handful of script bundles. Some depend on others, and
//! all of them depend on the first (`core`). This crate loads them through a
//! caller-supplied [`ScriptLoader`], honoring that graph, and once every bundle
//! is in place runs a fixed initialization sequence against an [`EngineHost`].
//!
//! # Architecture
//!
//! ```text
//! Sequencer::run(manifest, base_url)
//!     ├── first resource, awaited on its own
//!     ├── remaining resources, polled together on one task
//!     │     └── each waits on its dependencies' watch signals (StateBoard)
//!     └── InitPlan::apply(host): construct → register plugins → create unit
//! ```
//!
//! Every state transition is published as a [`LoadEvent`] to the configured
//! [`EventSink`] and to `tracing`. A failed run notifies the [`Notifier`] once.
//!
//! # Example
//!
//! ```rust,no_run
//! use sheetload::{Manifest, Sequencer};
//! # use sheetload::{EngineHost, ScriptLoader};
//! # async fn example<L: ScriptLoader, H: EngineHost>(loader: L, host: H) -> sheetload::Result<()> {
//! let mut sequencer = Sequencer::new(loader, host);
//! let report = sequencer
//!     .run(&Manifest::default_bundles(), "https://cdn.example.com/engine")
//!     .await?;
//! println!("engine ready in {:?}", report.elapsed);
//! # Ok(())
//! # }
//! ```

pub mod board;
pub mod error;
pub mod host;
pub mod loader;
pub mod sequencer;
pub mod sink;

pub use board::StateBoard;
pub use error::{InitError, InitStep, Result, RunError};
pub use host::{EngineHost, InitPlan};
pub use loader::ScriptLoader;
pub use sequencer::{RunReport, Sequencer, SequencerOptions};
pub use sink::{EventSink, Notifier, TracingNotifier};

// Re-export the data model so most callers only need this crate
pub use sheetload_core::{
    EngineConfig, ErrorRecord, EventLevel, LoadEvent, Manifest, ManifestError, PluginSpec,
    ResourceDescriptor, ResourceState, RunState, SheetData, UnitKind, WorkbookData,
};
