//! Outlets for status events and user-facing failure notices.

use std::rc::Rc;
use std::sync::Arc;

use sheetload_core::LoadEvent;
use tokio::sync::{broadcast, mpsc};

/// Receives every status event of a run
pub trait EventSink {
    fn emit(&self, event: &LoadEvent);
}

/// Discards events
impl EventSink for () {
    fn emit(&self, _event: &LoadEvent) {}
}

impl EventSink for mpsc::UnboundedSender<LoadEvent> {
    fn emit(&self, event: &LoadEvent) {
        // A dropped receiver just means nobody is listening anymore
        let _ = self.send(event.clone());
    }
}

impl EventSink for broadcast::Sender<LoadEvent> {
    fn emit(&self, event: &LoadEvent) {
        let _ = self.send(event.clone());
    }
}

impl<S: EventSink + ?Sized> EventSink for Rc<S> {
    fn emit(&self, event: &LoadEvent) {
        (**self).emit(event)
    }
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, event: &LoadEvent) {
        (**self).emit(event)
    }
}

/// Shows a failure to the user (toast, alert, dialog)
pub trait Notifier {
    fn notify(&self, title: &str, message: &str);
}

impl Notifier for () {
    fn notify(&self, _title: &str, _message: &str) {}
}

impl<N: Notifier + ?Sized> Notifier for Rc<N> {
    fn notify(&self, title: &str, message: &str) {
        (**self).notify(title, message)
    }
}

/// Default notifier: writes the notice to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, title: &str, message: &str) {
        tracing::warn!(title, "{message}");
    }
}
