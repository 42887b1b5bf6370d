//! Per-run resource state with completion signals.
//!
//! Each resource owns a `watch` channel holding its current [`ResourceState`].
//! Dependents subscribe and wake as soon as the value turns terminal, so no
//! polling interval is involved. The board is rebuilt at the start of every
//! run and owned by a single sequencer.

use std::cell::RefCell;
use std::collections::HashMap;

use sheetload_core::{ErrorRecord, Manifest, ResourceState};
use tokio::sync::watch;

#[derive(Debug, Default)]
pub struct StateBoard {
    /// Resource names in manifest order
    order: Vec<String>,
    signals: HashMap<String, watch::Sender<ResourceState>>,
    errors: RefCell<Vec<ErrorRecord>>,
}

impl StateBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put every resource of `manifest` back to NotStarted and clear recorded errors.
    ///
    /// Signals from a previous run are dropped, so stale subscribers observe a
    /// closed channel rather than the new run's states.
    pub fn reset(&mut self, manifest: &Manifest) {
        self.order = manifest.resources().iter().map(|r| r.name.clone()).collect();
        self.signals = self
            .order
            .iter()
            .map(|name| (name.clone(), watch::channel(ResourceState::NotStarted).0))
            .collect();
        self.errors.get_mut().clear();
    }

    /// Forget every resource and recorded error
    pub fn clear(&mut self) {
        self.order.clear();
        self.signals.clear();
        self.errors.get_mut().clear();
    }

    pub fn state(&self, name: &str) -> Option<ResourceState> {
        self.signals.get(name).map(|tx| *tx.borrow())
    }

    /// Move `name` to `next`.
    ///
    /// Returns false (and leaves the state untouched) for unknown resources and
    /// for transitions that would break the forward-only progression.
    pub(crate) fn transition(&self, name: &str, next: ResourceState) -> bool {
        let Some(tx) = self.signals.get(name) else {
            return false;
        };

        let current = *tx.borrow();
        if !current.can_transition_to(next) {
            tracing::warn!("Rejected transition of '{name}' from {current} to {next}");
            return false;
        }

        tx.send_replace(next);
        true
    }

    /// Subscribe to state changes of `name`
    pub fn subscribe(&self, name: &str) -> Option<watch::Receiver<ResourceState>> {
        self.signals.get(name).map(watch::Sender::subscribe)
    }

    pub(crate) fn record_error(&self, record: ErrorRecord) {
        self.errors.borrow_mut().push(record);
    }

    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.errors.borrow().clone()
    }

    /// Every resource with its state, in manifest order
    pub fn snapshot(&self) -> Vec<(String, ResourceState)> {
        self.order
            .iter()
            .map(|name| (name.clone(), self.state(name).unwrap_or_default()))
            .collect()
    }

    /// Whether every resource reached Loaded
    pub fn all_loaded(&self) -> bool {
        !self.order.is_empty()
            && self
                .order
                .iter()
                .all(|name| self.state(name) == Some(ResourceState::Loaded))
    }
}
