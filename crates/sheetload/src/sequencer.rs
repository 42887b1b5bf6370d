//! The resource loader sequencer.
//!
//! A run loads the foundational resource on its own, then drives every other
//! resource concurrently on the calling task. A resource starts only once all
//! of its dependencies are Loaded. The first failure ends the run: futures
//! still in flight are dropped where they stand, dependents are reported as
//! skipped, and the engine is never initialized.

use std::time::Duration;

use chrono::Utc;
use futures::future::try_join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use sheetload_core::{
    ErrorRecord, EventLevel, LoadEvent, Manifest, ResourceDescriptor, ResourceState, RunState,
};

use crate::board::StateBoard;
use crate::error::{Result, RunError};
use crate::host::{EngineHost, InitPlan};
use crate::loader::ScriptLoader;
use crate::sink::{EventSink, Notifier, TracingNotifier};

/// Title of the user-facing notice for a failed run
const FAILURE_TITLE: &str = "Spreadsheet failed to load";

/// Timing policy for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencerOptions {
    /// Bound on a single script load. Default: 30 seconds.
    pub load_timeout: Option<Duration>,
    /// Bound on waiting for a resource's dependencies. Default: 30 seconds.
    pub dependency_timeout: Option<Duration>,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self {
            load_timeout: Some(Duration::from_secs(30)),
            dependency_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl SequencerOptions {
    /// No bounds at all. Required where no tokio timer driver is running
    /// (e.g. inside a browser event loop).
    pub fn unbounded() -> Self {
        Self {
            load_timeout: None,
            dependency_timeout: None,
        }
    }
}

/// Result of a successful run
#[derive(Debug)]
pub struct RunReport<I> {
    /// The initialized engine
    pub instance: I,
    /// Final state of every resource, in manifest order
    pub states: Vec<(String, ResourceState)>,
    pub elapsed: Duration,
}

/// Loads a manifest's resources in dependency order and initializes the engine.
pub struct Sequencer<L, H> {
    loader: L,
    host: H,
    options: SequencerOptions,
    plan: InitPlan,
    events: Box<dyn EventSink>,
    notifier: Box<dyn Notifier>,
    board: StateBoard,
    run_state: RunState,
}

impl<L, H> Sequencer<L, H>
where
    L: ScriptLoader,
    H: EngineHost,
{
    pub fn new(loader: L, host: H) -> Self {
        Self {
            loader,
            host,
            options: SequencerOptions::default(),
            plan: InitPlan::default(),
            events: Box::new(()),
            notifier: Box::new(TracingNotifier),
            board: StateBoard::new(),
            run_state: RunState::Idle,
        }
    }

    pub fn with_options(mut self, options: SequencerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_plan(mut self, plan: InitPlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn with_event_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.events = Box::new(sink);
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// State of a resource in the current (or last) run
    pub fn state(&self, name: &str) -> Option<ResourceState> {
        self.board.state(name)
    }

    /// Failures recorded during the current (or last) run
    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.board.errors()
    }

    pub fn board(&self) -> &StateBoard {
        &self.board
    }

    pub fn options(&self) -> &SequencerOptions {
        &self.options
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Validate `resources` as a manifest, then [`run`](Self::run) it.
    pub async fn run_resources(
        &mut self,
        resources: Vec<ResourceDescriptor>,
        base_url: &str,
    ) -> Result<RunReport<H::Instance>> {
        // Nothing from a previous run survives a rejected manifest
        self.board.clear();
        self.run_state = RunState::Running;

        let manifest = match Manifest::new(resources) {
            Ok(manifest) => manifest,
            Err(e) => {
                let err = RunError::from(e);
                self.emit(LoadEvent::error("Rejected resource manifest", err.to_string()));
                self.fail(None, &err);
                return Err(err);
            }
        };
        self.run(&manifest, base_url).await
    }

    /// Load every resource of `manifest` from `base_url`, then initialize the engine.
    ///
    /// Starts from a clean slate: all states go back to NotStarted and
    /// previously recorded errors are cleared.
    pub async fn run(
        &mut self,
        manifest: &Manifest,
        base_url: &str,
    ) -> Result<RunReport<H::Instance>> {
        let started = Utc::now();
        self.board.reset(manifest);
        self.run_state = RunState::Running;

        tracing::info!("Loading {} resources from {base_url}", manifest.len());

        let loaded = self.load_all(manifest, base_url).await;
        if let Err(err) = loaded {
            self.fail(Some(manifest), &err);
            return Err(err);
        }

        self.emit(LoadEvent::info("All resources loaded, initializing engine"));
        let instance = match self.plan.apply(&mut self.host) {
            Ok(instance) => instance,
            Err(e) => {
                let err = RunError::from(e);
                self.emit(LoadEvent::error("Engine initialization failed", err.to_string()));
                self.fail(None, &err);
                return Err(err);
            }
        };

        let elapsed = (Utc::now() - started).to_std().unwrap_or_default();
        self.run_state = RunState::Completed;
        self.emit(LoadEvent::success(format!(
            "Engine ready ({} resources in {} ms)",
            manifest.len(),
            elapsed.as_millis()
        )));

        Ok(RunReport {
            instance,
            states: self.board.snapshot(),
            elapsed,
        })
    }

    async fn load_all(&self, manifest: &Manifest, base_url: &str) -> Result<()> {
        // The foundational resource is a precondition for everything else
        self.load_one(manifest, manifest.first(), base_url).await?;

        let mut pending: FuturesUnordered<_> = manifest
            .rest()
            .iter()
            .map(|resource| self.load_when_ready(manifest, resource, base_url))
            .collect();

        while let Some(result) = pending.next().await {
            result?;
        }

        Ok(())
    }

    async fn load_when_ready(
        &self,
        manifest: &Manifest,
        resource: &ResourceDescriptor,
        base_url: &str,
    ) -> Result<()> {
        try_join_all(
            resource
                .dependencies
                .iter()
                .map(|dep| self.wait_for_dependency(resource, dep)),
        )
        .await?;

        self.load_one(manifest, resource, base_url).await
    }

    async fn wait_for_dependency(&self, resource: &ResourceDescriptor, dependency: &str) -> Result<()> {
        let skipped = || RunError::Dependency {
            resource: resource.name.clone(),
            dependency: dependency.to_string(),
        };

        let mut rx = self.board.subscribe(dependency).ok_or_else(skipped)?;

        let state = {
            let settled = rx.wait_for(|s| s.is_terminal());
            let observed = match self.options.dependency_timeout {
                Some(limit) => match tokio::time::timeout(limit, settled).await {
                    Ok(observed) => observed,
                    Err(_) => {
                        let cause = format!("timed out after {limit:?} waiting for '{dependency}'");
                        self.board.record_error(ErrorRecord::new(&resource.name, &cause));
                        self.emit(LoadEvent::error(format!("Gave up on {}", resource.name), cause)
                            .for_resource(&resource.name));
                        return Err(RunError::DependencyTimeout {
                            resource: resource.name.clone(),
                            dependency: dependency.to_string(),
                            waited: limit,
                        });
                    }
                },
                None => settled.await,
            };
            // Closed only once the board is rebuilt, which needs `&mut self`
            observed.map(|s| *s).unwrap_or(ResourceState::Error)
        };

        // Skip warnings for dependents are emitted once, by `fail`
        if state == ResourceState::Loaded {
            Ok(())
        } else {
            Err(skipped())
        }
    }

    async fn load_one(&self, manifest: &Manifest, resource: &ResourceDescriptor, base_url: &str) -> Result<()> {
        let name = resource.name.as_str();
        let url = manifest.resolve_url(base_url, resource);

        self.board.transition(name, ResourceState::Loading);
        self.emit(LoadEvent::info(format!("Loading {name} from {url}")).for_resource(name));

        let outcome = match self.options.load_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.loader.load(&url)).await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(_) => Err(format!("timed out after {limit:?}")),
            },
            None => self.loader.load(&url).await.map_err(|e| e.to_string()),
        };

        match outcome {
            Ok(()) => {
                self.board.transition(name, ResourceState::Loaded);
                self.emit(LoadEvent::success(format!("Loaded {name}")).for_resource(name));
                Ok(())
            }
            Err(cause) => {
                self.board.transition(name, ResourceState::Error);
                self.board.record_error(ErrorRecord::new(name, &cause));
                self.emit(LoadEvent::error(format!("Failed to load {name}"), &cause).for_resource(name));
                Err(RunError::ScriptLoad {
                    resource: name.to_string(),
                    url,
                    cause,
                })
            }
        }
    }

    /// Mark the run Failed, report untouched dependents and notify the user once.
    fn fail(&mut self, manifest: Option<&Manifest>, err: &RunError) {
        self.run_state = RunState::Failed;

        if let (Some(manifest), Some(failed)) = (manifest, err.resource()) {
            for dependent in manifest.dependents_of(failed) {
                if self.board.state(&dependent.name) == Some(ResourceState::NotStarted) {
                    self.emit(
                        LoadEvent::warning(format!(
                            "Skipping {}: depends on failed resource {failed}",
                            dependent.name
                        ))
                        .for_resource(&dependent.name),
                    );
                }
            }
        }

        tracing::debug!("Load run failed: {err}");
        self.notifier.notify(FAILURE_TITLE, &err.to_string());
    }

    fn emit(&self, event: LoadEvent) {
        let resource = event.resource.as_deref().unwrap_or("-");
        match event.level {
            EventLevel::Info => tracing::info!(resource, "{}", event.message),
            EventLevel::Success => tracing::info!(resource, "{}", event.message),
            EventLevel::Warning => tracing::warn!(resource, "{}", event.message),
            EventLevel::Error => tracing::error!(
                resource,
                cause = event.error.as_deref().unwrap_or_default(),
                "{}",
                event.message
            ),
        }
        self.events.emit(&event);
    }
}
