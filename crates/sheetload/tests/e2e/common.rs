//! Common utilities for E2E tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

use sheetload::{
    EngineConfig, EngineHost, LoadEvent, Manifest, Notifier, PluginSpec, ResourceDescriptor,
    ScriptLoader, Sequencer, UnitKind, WorkbookData,
};
use tokio::sync::mpsc;

/// Latency used for resources without a scripted one
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(10);

/// Something the fake loader observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderCall {
    Start(String),
    Finish(String),
}

/// In-memory script loader with scripted latency, failures and hangs.
///
/// Resource names are recovered from the URL's last segment (`/a.js` -> `a`).
#[derive(Default)]
pub struct FakeLoader {
    latency: HashMap<String, Duration>,
    failing: RefCell<HashSet<String>>,
    hanging: HashSet<String>,
    instant: bool,
    log: RefCell<Vec<LoaderCall>>,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latency(mut self, name: &str, millis: u64) -> Self {
        self.latency.insert(name.to_string(), Duration::from_millis(millis));
        self
    }

    pub fn failing(self, name: &str) -> Self {
        self.failing.borrow_mut().insert(name.to_string());
        self
    }

    pub fn hanging(mut self, name: &str) -> Self {
        self.hanging.insert(name.to_string());
        self
    }

    /// Resolve every load immediately, without touching the tokio timer
    pub fn instant(mut self) -> Self {
        self.instant = true;
        self
    }

    /// Make a previously failing resource load successfully from now on
    pub fn heal(&self, name: &str) {
        self.failing.borrow_mut().remove(name);
    }

    pub fn log(&self) -> Vec<LoaderCall> {
        self.log.borrow().clone()
    }

    pub fn clear_log(&self) {
        self.log.borrow_mut().clear();
    }

    /// Names of resources whose load was attempted, in order
    pub fn started(&self) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter_map(|call| match call {
                LoaderCall::Start(name) => Some(name.clone()),
                LoaderCall::Finish(_) => None,
            })
            .collect()
    }

    /// Position of a call in the log
    pub fn position(&self, call: &LoaderCall) -> Option<usize> {
        self.log.borrow().iter().position(|c| c == call)
    }
}

pub fn resource_name(url: &str) -> String {
    url.rsplit('/')
        .next()
        .unwrap_or(url)
        .trim_end_matches(".js")
        .to_string()
}

impl ScriptLoader for FakeLoader {
    type Error = String;

    async fn load(&self, url: &str) -> Result<(), String> {
        let name = resource_name(url);
        self.log.borrow_mut().push(LoaderCall::Start(name.clone()));

        if self.hanging.contains(&name) {
            std::future::pending::<()>().await;
        }

        if !self.instant {
            let latency = self.latency.get(&name).copied().unwrap_or(DEFAULT_LATENCY);
            tokio::time::sleep(latency).await;
        }

        self.log.borrow_mut().push(LoaderCall::Finish(name.clone()));
        if self.failing.borrow().contains(&name) {
            return Err(format!("404 Not Found: {url}"));
        }
        Ok(())
    }
}

/// What the fake host hands back as the engine instance
#[derive(Debug, Clone, PartialEq)]
pub struct FakeEngine {
    pub config: EngineConfig,
    pub plugins: Vec<String>,
    pub units: Vec<(UnitKind, String)>,
}

#[derive(Debug, Default)]
pub struct FakeHost {
    pub constructed: usize,
    pub reject_unit: bool,
}

impl EngineHost for FakeHost {
    type Instance = FakeEngine;
    type Error = String;

    fn construct(&mut self, config: &EngineConfig) -> Result<FakeEngine, String> {
        self.constructed += 1;
        Ok(FakeEngine {
            config: config.clone(),
            plugins: Vec::new(),
            units: Vec::new(),
        })
    }

    fn register_plugin(&mut self, instance: &mut FakeEngine, plugin: &PluginSpec) -> Result<(), String> {
        instance.plugins.push(plugin.name.clone());
        Ok(())
    }

    fn create_unit(
        &mut self,
        instance: &mut FakeEngine,
        kind: UnitKind,
        data: &WorkbookData,
    ) -> Result<(), String> {
        if self.reject_unit {
            return Err("container element not found".to_string());
        }
        instance.units.push((kind, data.id.clone()));
        Ok(())
    }
}

/// Collects failure notices
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: RefCell<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<(String, String)> {
        self.notices.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        self.notices
            .borrow_mut()
            .push((title.to_string(), message.to_string()));
    }
}

/// A sequencer wired to an event channel and a recording notifier
pub struct Harness {
    pub sequencer: Sequencer<FakeLoader, FakeHost>,
    pub events: mpsc::UnboundedReceiver<LoadEvent>,
    pub notifier: Rc<RecordingNotifier>,
}

impl Harness {
    pub fn new(loader: FakeLoader) -> Self {
        Self::with_host(loader, FakeHost::default())
    }

    pub fn with_host(loader: FakeLoader, host: FakeHost) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let notifier = Rc::new(RecordingNotifier::default());
        let sequencer = Sequencer::new(loader, host)
            .with_event_sink(tx)
            .with_notifier(Rc::clone(&notifier));

        Self {
            sequencer,
            events: rx,
            notifier,
        }
    }

    /// Every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<LoadEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

/// core <- a, core <- b, (a, b) <- c
pub fn diamond() -> Manifest {
    Manifest::new(vec![
        ResourceDescriptor::root("core", "/core.js"),
        ResourceDescriptor::new("a", "/a.js", ["core"]),
        ResourceDescriptor::new("b", "/b.js", ["core"]),
        ResourceDescriptor::new("c", "/c.js", ["a", "b"]),
    ])
    .unwrap()
}

/// core <- a <- b <- c
pub fn chain() -> Manifest {
    Manifest::new(vec![
        ResourceDescriptor::root("core", "/core.js"),
        ResourceDescriptor::new("a", "/a.js", ["core"]),
        ResourceDescriptor::new("b", "/b.js", ["a"]),
        ResourceDescriptor::new("c", "/c.js", ["b"]),
    ])
    .unwrap()
}

pub const BASE_URL: &str = "https://static.example.com/engine/";
