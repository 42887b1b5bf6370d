//! Ordering guarantees of successful runs.

use pretty_assertions::assert_eq;
use sheetload::{Manifest, ResourceState, RunState, SequencerOptions, UnitKind};
use tokio::time::Instant;

use crate::common::*;

#[tokio::test(start_paused = true)]
async fn test_diamond_loads_everything_and_initializes_once() {
    let mut h = Harness::new(FakeLoader::new().latency("a", 30).latency("b", 80));

    let report = h.sequencer.run(&diamond(), BASE_URL).await.unwrap();

    assert_eq!(h.sequencer.run_state(), RunState::Completed);
    assert_eq!(
        report.states,
        vec![
            ("core".to_string(), ResourceState::Loaded),
            ("a".to_string(), ResourceState::Loaded),
            ("b".to_string(), ResourceState::Loaded),
            ("c".to_string(), ResourceState::Loaded),
        ]
    );
    assert_eq!(h.sequencer.host().constructed, 1);
    assert_eq!(report.instance.units, vec![(UnitKind::Sheet, "workbook-01".to_string())]);
    assert!(h.sequencer.errors().is_empty());
    assert!(h.notifier.notices().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_dependent_starts_only_after_all_dependencies_loaded() {
    // b is much slower than a: c must still wait for b
    let mut h = Harness::new(FakeLoader::new().latency("a", 10).latency("b", 200));

    h.sequencer.run(&diamond(), BASE_URL).await.unwrap();

    let loader = h.sequencer.loader();
    let c_start = loader.position(&LoaderCall::Start("c".into())).unwrap();
    let a_done = loader.position(&LoaderCall::Finish("a".into())).unwrap();
    let b_done = loader.position(&LoaderCall::Finish("b".into())).unwrap();
    assert!(c_start > a_done);
    assert!(c_start > b_done);
}

#[tokio::test(start_paused = true)]
async fn test_first_resource_completes_before_anything_else_starts() {
    let mut h = Harness::new(FakeLoader::new().latency("core", 500));

    h.sequencer
        .run(&Manifest::default_bundles(), BASE_URL)
        .await
        .unwrap();

    let log = h.sequencer.loader().log();
    assert_eq!(log[0], LoaderCall::Start("core".into()));
    assert_eq!(log[1], LoaderCall::Finish("core".into()));
    assert_eq!(h.sequencer.loader().started().len(), 8);
}

#[tokio::test(start_paused = true)]
async fn test_independent_siblings_load_concurrently() {
    let mut h = Harness::new(
        FakeLoader::new()
            .latency("core", 10)
            .latency("a", 100)
            .latency("b", 100)
            .latency("c", 10),
    );

    let started = Instant::now();
    h.sequencer.run(&diamond(), BASE_URL).await.unwrap();
    let elapsed = started.elapsed();

    // Sequential loading of a and b would take at least 220ms
    assert!(elapsed.as_millis() < 200, "took {elapsed:?}");

    let started_names = h.sequencer.loader().started();
    let a = started_names.iter().position(|n| n == "a").unwrap();
    let b = started_names.iter().position(|n| n == "b").unwrap();
    let a_done = h.sequencer.loader().position(&LoaderCall::Finish("a".into())).unwrap();
    let b_start = h.sequencer.loader().position(&LoaderCall::Start("b".into())).unwrap();
    assert!(a < 3 && b < 3);
    assert!(b_start < a_done, "b should start before a finishes");
}

#[tokio::test(start_paused = true)]
async fn test_default_bundles_respect_dependency_graph() {
    let mut h = Harness::new(
        FakeLoader::new()
            .latency("engine-render", 120)
            .latency("docs", 5)
            .latency("engine-formula", 60),
    );
    let manifest = Manifest::default_bundles();

    h.sequencer.run(&manifest, BASE_URL).await.unwrap();

    let loader = h.sequencer.loader();
    for resource in manifest.resources() {
        let start = loader
            .position(&LoaderCall::Start(resource.name.clone()))
            .unwrap();
        for dep in &resource.dependencies {
            let done = loader.position(&LoaderCall::Finish(dep.clone())).unwrap();
            assert!(done < start, "{} started before {dep} finished", resource.name);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_urls_are_resolved_against_base() {
    let mut h = Harness::new(FakeLoader::new());
    h.sequencer.run(&diamond(), BASE_URL).await.unwrap();

    let events = h.drain_events();
    let event = events
        .iter()
        .find(|e| e.message.starts_with("Loading core"))
        .unwrap();
    assert_eq!(
        event.message,
        "Loading core from https://static.example.com/engine/core.js"
    );
}

#[test]
fn test_unbounded_options_need_no_timer() {
    // Timers are disabled on this runtime
    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let mut h = Harness::new(FakeLoader::new().instant());
    h.sequencer = h.sequencer.with_options(SequencerOptions::unbounded());

    let report = rt.block_on(h.sequencer.run(&diamond(), BASE_URL)).unwrap();
    assert!(report.states.iter().all(|(_, s)| *s == ResourceState::Loaded));
}
