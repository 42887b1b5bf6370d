//! Resource descriptors and the validated manifest that orders them.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{ManifestError, Result};

/// A named, independently loadable script bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Unique identifier within a manifest
    pub name: String,
    /// URL suffix appended to the base URL, e.g. `/core.js`
    pub path: String,
    /// Resources that must be Loaded before this one may start
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub dependencies: BTreeSet<String>,
}

impl ResourceDescriptor {
    /// Create a descriptor with the given dependencies
    pub fn new<I, S>(name: impl Into<String>, path: impl Into<String>, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            path: path.into(),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a descriptor with no prerequisites
    pub fn root(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, path, std::iter::empty::<String>())
    }

    /// Whether this resource can load without waiting on others
    pub fn is_independent(&self) -> bool {
        self.dependencies.is_empty()
    }
}

/// An ordered, validated set of resources.
///
/// The first resource is foundational: it has no dependencies and is always
/// loaded before anything else is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Manifest {
    resources: Vec<ResourceDescriptor>,
}

impl Manifest {
    /// Validate and wrap an ordered list of resources
    pub fn new(resources: Vec<ResourceDescriptor>) -> Result<Self> {
        validate(&resources)?;
        Ok(Self { resources })
    }

    /// Parse a manifest from a JSON array of descriptors
    pub fn from_json(json: &str) -> Result<Self> {
        let resources: Vec<ResourceDescriptor> = serde_json::from_str(json)?;
        Self::new(resources)
    }

    /// Serialize the manifest as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The bundle graph of the spreadsheet engine distribution
    pub fn default_bundles() -> Self {
        Self {
            resources: vec![
                ResourceDescriptor::root("core", "/core.js"),
                ResourceDescriptor::new("engine-render", "/engine-render.js", ["core"]),
                ResourceDescriptor::new("engine-formula", "/engine-formula.js", ["core"]),
                ResourceDescriptor::new("docs", "/docs.js", ["core"]),
                ResourceDescriptor::new("docs-ui", "/docs-ui.js", ["docs", "engine-render"]),
                ResourceDescriptor::new("sheets", "/sheets.js", ["core", "engine-formula"]),
                ResourceDescriptor::new(
                    "sheets-ui",
                    "/sheets-ui.js",
                    ["sheets", "engine-render", "docs-ui"],
                ),
                ResourceDescriptor::new("sheets-facade", "/sheets-facade.js", ["sheets-ui"]),
            ],
        }
    }

    /// The foundational resource
    pub fn first(&self) -> &ResourceDescriptor {
        // validate() rejects empty manifests
        &self.resources[0]
    }

    /// Everything after the foundational resource, in manifest order
    pub fn rest(&self) -> &[ResourceDescriptor] {
        &self.resources[1..]
    }

    pub fn resources(&self) -> &[ResourceDescriptor] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Look up a resource by name
    pub fn get(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Join a base URL and a resource path, tolerating a trailing slash on the base
    pub fn resolve_url(&self, base_url: &str, resource: &ResourceDescriptor) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), resource.path)
    }

    /// A dependency-respecting order: the first resource, then the rest in
    /// topological order with ties broken by manifest position.
    pub fn load_order(&self) -> Vec<&ResourceDescriptor> {
        let mut done: HashSet<&str> = HashSet::new();
        let mut order = Vec::with_capacity(self.resources.len());

        while order.len() < self.resources.len() {
            let next = self
                .resources
                .iter()
                .find(|r| {
                    !done.contains(r.name.as_str())
                        && r.dependencies.iter().all(|d| done.contains(d.as_str()))
                });
            match next {
                Some(r) => {
                    done.insert(&r.name);
                    order.push(r);
                }
                // Unreachable for a validated (acyclic) manifest
                None => break,
            }
        }

        order
    }

    /// Every resource that depends on `name` directly or transitively, in manifest order
    pub fn dependents_of(&self, name: &str) -> Vec<&ResourceDescriptor> {
        let mut affected: HashSet<&str> = HashSet::new();
        affected.insert(name);

        // Fixed point: the manifest is small and acyclic
        loop {
            let before = affected.len();
            for r in &self.resources {
                if r.dependencies.iter().any(|d| affected.contains(d.as_str())) {
                    affected.insert(&r.name);
                }
            }
            if affected.len() == before {
                break;
            }
        }

        self.resources
            .iter()
            .filter(|r| r.name != name && affected.contains(r.name.as_str()))
            .collect()
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::default_bundles()
    }
}

impl<'de> Deserialize<'de> for Manifest {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let resources = Vec::<ResourceDescriptor>::deserialize(deserializer)?;
        Manifest::new(resources).map_err(serde::de::Error::custom)
    }
}

fn validate(resources: &[ResourceDescriptor]) -> Result<()> {
    let first = resources.first().ok_or(ManifestError::Empty)?;
    if !first.is_independent() {
        return Err(ManifestError::FirstHasDependencies(first.name.clone()));
    }

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(resources.len());
    for (i, r) in resources.iter().enumerate() {
        if index.insert(r.name.as_str(), i).is_some() {
            return Err(ManifestError::DuplicateName(r.name.clone()));
        }
        if !r.path.starts_with('/') {
            return Err(ManifestError::InvalidPath {
                resource: r.name.clone(),
                path: r.path.clone(),
            });
        }
    }

    for r in resources {
        for dep in &r.dependencies {
            if dep == &r.name {
                return Err(ManifestError::SelfDependency(r.name.clone()));
            }
            if !index.contains_key(dep.as_str()) {
                return Err(ManifestError::UnknownDependency {
                    resource: r.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    detect_cycle(resources, &index)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

fn detect_cycle(resources: &[ResourceDescriptor], index: &HashMap<&str, usize>) -> Result<()> {
    let mut marks = vec![Mark::Unvisited; resources.len()];

    for start in 0..resources.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }

        // Iterative DFS: (node, next dependency position)
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        marks[start] = Mark::InProgress;

        while let Some(top) = stack.last_mut() {
            let (node, pos) = *top;
            if let Some(name) = resources[node].dependencies.iter().nth(pos) {
                top.1 += 1;
                let dep = index[name.as_str()];
                match marks[dep] {
                    Mark::InProgress => {
                        return Err(ManifestError::Cycle(resources[dep].name.clone()));
                    }
                    Mark::Unvisited => {
                        marks[dep] = Mark::InProgress;
                        stack.push((dep, 0));
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                stack.pop();
            }
        }
    }

    Ok(())
}
