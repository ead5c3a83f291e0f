//! Generic dependency descriptors.
//!
//! A [`ModuleDescriptor`] is what a dependency-management engine consumes:
//! a module identity, named configurations, dependency edges that map the
//! depender's configurations onto the dependee's, and the artifacts each
//! module publishes. Nothing in here is specific to bundles.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use bundle_manifest::{BundleDescriptor, Version};
use serde::{Deserialize, Serialize};

use crate::resolver::Tier;

/// Mandatory dependencies only.
pub const CONF_DEFAULT: &str = "default";
/// `default` plus directly declared optional dependencies.
pub const CONF_OPTIONAL: &str = "optional";
/// `optional` plus optional dependencies of dependencies.
pub const CONF_TRANSITIVE_OPTIONAL: &str = "transitive-optional";

/// Organisation-less module identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId {
    pub name: String,
    pub revision: Version,
}

impl ModuleId {
    pub fn new(name: impl Into<String>, revision: Version) -> Self {
        Self {
            name: name.into(),
            revision,
        }
    }

    /// Identity of a bundle: symbolic name and bundle version.
    pub fn of(bundle: &BundleDescriptor) -> Self {
        Self::new(bundle.symbolic_name(), bundle.version().clone())
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.name, self.revision)
    }
}

/// A named subset of a module's dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub name: String,
    /// Configurations whose dependencies this one includes.
    pub extends: Vec<String>,
    pub description: String,
}

impl Configuration {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: Vec::new(),
            description: description.into(),
        }
    }

    pub fn extending(mut self, parent: impl Into<String>) -> Self {
        self.extends.push(parent.into());
        self
    }

    /// The three configurations every bundle module declares.
    pub fn standard() -> Vec<Configuration> {
        vec![
            Configuration::new(CONF_DEFAULT, "Mandatory dependencies"),
            Configuration::new(CONF_OPTIONAL, "Mandatory and optional dependencies")
                .extending(CONF_DEFAULT),
            Configuration::new(
                CONF_TRANSITIVE_OPTIONAL,
                "Optional dependencies of dependencies too",
            )
            .extending(CONF_OPTIONAL),
        ]
    }
}

/// Edge from the described module to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub target: ModuleId,
    pub tier: Tier,
    /// Depender configuration -> dependee configuration.
    pub mappings: BTreeMap<String, String>,
}

impl DependencyEdge {
    /// Edge with the configuration mappings a dependency at `tier` gets.
    pub fn new(target: ModuleId, tier: Tier) -> Self {
        let pairs: &[(&str, &str)] = match tier {
            Tier::Mandatory => &[
                (CONF_DEFAULT, CONF_DEFAULT),
                (CONF_TRANSITIVE_OPTIONAL, CONF_TRANSITIVE_OPTIONAL),
            ],
            Tier::Optional => &[
                (CONF_OPTIONAL, CONF_DEFAULT),
                (CONF_TRANSITIVE_OPTIONAL, CONF_TRANSITIVE_OPTIONAL),
            ],
            Tier::TransitiveOptional => &[(CONF_TRANSITIVE_OPTIONAL, CONF_TRANSITIVE_OPTIONAL)],
        };
        Self {
            target,
            tier,
            mappings: pairs
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }

    /// Dependee configuration pulled in by depender configuration `conf`.
    pub fn mapped(&self, conf: &str) -> Option<&str> {
        self.mappings.get(conf).map(String::as_str)
    }
}

/// A file a module publishes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artifact {
    pub module: ModuleId,
    pub name: String,
    /// `jar` for bundles.
    pub kind: String,
    pub ext: String,
    /// Where the artifact is fetched from, as listed by the repository.
    pub location: Option<String>,
}

impl Artifact {
    pub fn jar(module: ModuleId) -> Self {
        Self {
            name: module.name.clone(),
            module,
            kind: "jar".to_string(),
            ext: "jar".to_string(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// `name-revision.ext`
    pub fn file_name(&self) -> String {
        format!("{}-{}.{}", self.name, self.module.revision, self.ext)
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}.{}", self.module, self.name, self.ext)
    }
}

/// A module as seen by the dependency engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub id: ModuleId,
    pub configurations: Vec<Configuration>,
    /// At most one edge per target, in first-appearance order.
    pub dependencies: Vec<DependencyEdge>,
    pub artifacts: Vec<Artifact>,
    /// Optional requirements nothing satisfied, kept as diagnostics.
    pub unsatisfied: Vec<String>,
}

impl ModuleDescriptor {
    pub fn configuration(&self, name: &str) -> Option<&Configuration> {
        self.configurations.iter().find(|c| c.name == name)
    }

    pub fn configuration_names(&self) -> impl Iterator<Item = &str> {
        self.configurations.iter().map(|c| c.name.as_str())
    }

    pub fn dependency(&self, target: &str) -> Option<&DependencyEdge> {
        self.dependencies.iter().find(|d| d.target.name == target)
    }

    /// `conf` and every configuration it extends, directly or not.
    ///
    /// Unknown names yield an empty set.
    pub fn expand_configuration(&self, conf: &str) -> BTreeSet<String> {
        let mut expanded = BTreeSet::new();
        let mut pending = vec![conf.to_string()];
        while let Some(name) = pending.pop() {
            let Some(configuration) = self.configuration(&name) else {
                continue;
            };
            if expanded.insert(name) {
                pending.extend(configuration.extends.iter().cloned());
            }
        }
        expanded
    }

    /// Edges that `conf` (with what it extends) pulls in, each with the
    /// dependee configuration to continue in.
    ///
    /// When several of the expanded configurations map the same edge, the
    /// mapping of `conf` itself wins, then the nearest parent.
    pub fn dependencies_for(&self, conf: &str) -> Vec<(&DependencyEdge, &str)> {
        let expanded = self.expand_configuration(conf);
        self.dependencies
            .iter()
            .filter_map(|edge| {
                self.nearest_mapping(edge, conf, &expanded)
                    .map(|target| (edge, target))
            })
            .collect()
    }

    fn nearest_mapping<'e>(
        &self,
        edge: &'e DependencyEdge,
        conf: &str,
        expanded: &BTreeSet<String>,
    ) -> Option<&'e str> {
        let mut frontier: Vec<&str> = vec![conf];
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for name in frontier {
                if !seen.insert(name) || !expanded.contains(name) {
                    continue;
                }
                if let Some(target) = edge.mapped(name) {
                    return Some(target);
                }
                if let Some(configuration) = self.configuration(name) {
                    next.extend(configuration.extends.iter().map(String::as_str));
                }
            }
            frontier = next;
        }
        None
    }

    /// Record where this module's artifacts are fetched from.
    pub fn with_artifact_location(mut self, location: Option<&str>) -> Self {
        if let Some(location) = location {
            for artifact in &mut self.artifacts {
                artifact.location = Some(location.to_string());
            }
        }
        self
    }
}
