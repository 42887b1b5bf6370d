//! End-to-end tests for the sheetload sequencer.
//!
//! Every test drives a real `Sequencer` against an in-memory script loader
//! whose per-resource latency and failures are scripted, and a fake engine
//! host that records the initialization calls. Tokio's clock is paused, so
//! latencies advance instantly while preserving their relative order.

mod common;
mod events;
mod sequencing;

// Re-export common utilities for submodules
pub use common::*;
