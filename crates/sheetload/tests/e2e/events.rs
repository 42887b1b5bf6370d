//! Status events and failure notices.

use std::io;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use sheetload::{EventLevel, LoadEvent};

use crate::common::*;

fn for_resource<'a>(events: &'a [LoadEvent], name: &str) -> Vec<&'a LoadEvent> {
    events
        .iter()
        .filter(|e| e.resource.as_deref() == Some(name))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_each_transition_emits_one_event() {
    let mut h = Harness::new(FakeLoader::new());
    h.sequencer.run(&diamond(), BASE_URL).await.unwrap();
    let events = h.drain_events();

    for name in ["core", "a", "b", "c"] {
        let levels: Vec<EventLevel> = for_resource(&events, name)
            .into_iter()
            .map(|e| e.level)
            .collect();
        assert_eq!(levels, vec![EventLevel::Info, EventLevel::Success], "{name}");
    }

    let last = events.last().unwrap();
    assert_eq!(last.level, EventLevel::Success);
    assert!(last.message.starts_with("Engine ready"));
    assert!(last.resource.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_dependent_loading_event_follows_dependency_success() {
    let mut h = Harness::new(FakeLoader::new().latency("b", 300));
    h.sequencer.run(&diamond(), BASE_URL).await.unwrap();
    let events = h.drain_events();

    let position = |level: EventLevel, name: &str| {
        events
            .iter()
            .position(|e| e.level == level && e.resource.as_deref() == Some(name))
            .unwrap()
    };
    assert!(position(EventLevel::Info, "c") > position(EventLevel::Success, "a"));
    assert!(position(EventLevel::Info, "c") > position(EventLevel::Success, "b"));
}

#[tokio::test(start_paused = true)]
async fn test_failure_emits_error_with_cause_and_skips_dependents() {
    let mut h = Harness::new(FakeLoader::new().failing("a"));
    h.sequencer.run(&chain(), BASE_URL).await.unwrap_err();
    let events = h.drain_events();

    let a = for_resource(&events, "a");
    assert_eq!(a.len(), 2);
    assert_eq!(a[1].level, EventLevel::Error);
    assert_eq!(
        a[1].error.as_deref(),
        Some("404 Not Found: https://static.example.com/engine/a.js")
    );

    for name in ["b", "c"] {
        let skipped = for_resource(&events, name);
        assert_eq!(skipped.len(), 1, "{name}");
        assert_eq!(skipped[0].level, EventLevel::Warning);
    }

    // Exactly one error event for the whole run
    let errors = events.iter().filter(|e| e.level == EventLevel::Error).count();
    assert_eq!(errors, 1);
}

#[tokio::test(start_paused = true)]
async fn test_notifier_fires_once_per_failed_run_only() {
    let mut h = Harness::new(FakeLoader::new().failing("c"));

    h.sequencer.run(&diamond(), BASE_URL).await.unwrap_err();
    let notices = h.notifier.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].0, "Spreadsheet failed to load");
    assert!(notices[0].1.contains("'c'"));

    h.sequencer.loader().heal("c");
    h.sequencer.run(&diamond(), BASE_URL).await.unwrap();
    assert_eq!(h.notifier.notices().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_event_timestamps_are_monotonic_and_serializable() {
    let mut h = Harness::new(FakeLoader::new());
    h.sequencer.run(&diamond(), BASE_URL).await.unwrap();
    let events = h.drain_events();

    assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    let json = serde_json::to_value(&events[0]).unwrap();
    assert_eq!(json["level"], "info");
    assert!(json["timestamp"].as_str().unwrap().contains('T'));
}

/// Captures formatted log output
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_failure_is_logged_at_error_level_once() {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut h = Harness::new(FakeLoader::new().failing("b"));
    h.sequencer.run(&diamond(), BASE_URL).await.unwrap_err();

    let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    let errors: Vec<&str> = output.lines().filter(|l| l.contains("ERROR")).collect();
    assert_eq!(errors.len(), 1, "{output}");
    assert!(errors[0].contains("Failed to load b"));
}
