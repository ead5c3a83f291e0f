//! Requirement/capability matching.
//!
//! [`resolve`] matches every `Import-Package` and `Require-Bundle` entry of
//! a bundle against a [`CapabilityIndex`]:
//!
//! 1. Candidates are the index's providers (in listing order) whose version
//!    lies in the requirement's range.
//! 2. The [`RequirementStrategy`] picks among them.
//! 3. A mandatory requirement without a provider fails the whole
//!    resolution; an optional one is recorded as unsatisfied.
//!
//! A resolved `Require-Bundle` also makes every package the chosen bundle
//! exports an implicit import, and so on through that bundle's own
//! `visibility:=reexport` requirements. Implicit imports are mandatory only
//! while every link of the chain is mandatory; an optional link demotes
//! everything below it to [`Tier::TransitiveOptional`].
//!
//! Everything iterates over ordered vectors, so the same bundle and index
//! always produce the same [`ResolutionResult`].

use std::collections::BTreeMap;
use std::fmt;

use bundle_manifest::{BundleDescriptor, Resolution, Version, VersionRange};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::index::CapabilityIndex;
use crate::module::{CONF_DEFAULT, CONF_OPTIONAL, CONF_TRANSITIVE_OPTIONAL, ModuleId};
use crate::strategy::RequirementStrategy;

/// Packages the runtime provides when none is configured.
pub const DEFAULT_SYSTEM_PACKAGES: &[&str] = &["java.*"];

/// Per-call resolution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveOptions {
    pub strategy: RequirementStrategy,
    /// Package names (or `prefix.*` patterns) provided by the runtime.
    pub system_packages: Vec<String>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            strategy: RequirementStrategy::default(),
            system_packages: DEFAULT_SYSTEM_PACKAGES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl ResolveOptions {
    pub fn with_strategy(mut self, strategy: RequirementStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_system_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.system_packages = packages.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `package` is provided by the runtime rather than a bundle.
    pub fn is_system_package(&self, package: &str) -> bool {
        self.system_packages.iter().any(|pattern| match pattern.strip_suffix(".*") {
            Some(prefix) => {
                package == prefix
                    || package
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('.'))
            }
            None => package == pattern,
        })
    }
}

/// Which configuration a requirement's providers end up in.
///
/// Ordered from strongest to weakest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    Mandatory,
    Optional,
    TransitiveOptional,
}

impl Tier {
    /// Tier of a requirement declared directly on the bundle.
    pub fn declared(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Mandatory => Tier::Mandatory,
            Resolution::Optional => Tier::Optional,
        }
    }

    /// Tier of something reached through a requirement at this tier that
    /// is itself declared with `resolution`.
    pub fn through(self, resolution: Resolution) -> Self {
        if self == Tier::Mandatory && resolution == Resolution::Mandatory {
            Tier::Mandatory
        } else {
            Tier::TransitiveOptional
        }
    }

    /// The configuration edges at this tier are published in.
    pub fn configuration(self) -> &'static str {
        match self {
            Tier::Mandatory => CONF_DEFAULT,
            Tier::Optional => CONF_OPTIONAL,
            Tier::TransitiveOptional => CONF_TRANSITIVE_OPTIONAL,
        }
    }

    pub fn resolution(self) -> Resolution {
        match self {
            Tier::Mandatory => Resolution::Mandatory,
            Tier::Optional | Tier::TransitiveOptional => Resolution::Optional,
        }
    }
}

/// What a requirement asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementKind {
    Package,
    Bundle,
}

/// Where a requirement comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Declared in the bundle's own manifest.
    Declared,
    /// Implied by a required bundle passing on its packages.
    Reexported { via: String },
}

/// A single requirement of the bundle being resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub kind: RequirementKind,
    pub name: String,
    pub range: VersionRange,
    pub resolution: Resolution,
    pub origin: Origin,
}

impl Requirement {
    /// `package com.example.api` or `bundle com.example.core`.
    pub fn subject(&self) -> String {
        match self.kind {
            RequirementKind::Package => format!("package {}", self.name),
            RequirementKind::Bundle => format!("bundle {}", self.name),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.subject(), self.range)
    }
}

/// A bundle chosen to satisfy a requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub module: ModuleId,
    /// The version the capability is offered at: the exported package
    /// version, or the bundle version for `Require-Bundle`.
    pub capability_version: Version,
}

impl Provider {
    fn new(bundle: &BundleDescriptor, capability_version: Version) -> Self {
        Self {
            module: ModuleId::of(bundle),
            capability_version,
        }
    }
}

/// How a requirement was met.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provision {
    /// By these repository bundles.
    Providers(Vec<Provider>),
    /// By the bundle itself, which exports the imported package.
    SelfProvided,
    /// By the runtime.
    System,
    /// Not at all.
    Unsatisfied,
}

/// One requirement with its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRequirement {
    pub requirement: Requirement,
    pub tier: Tier,
    pub provision: Provision,
}

impl ResolvedRequirement {
    /// Providers contributing dependency edges; empty unless
    /// [`Provision::Providers`].
    pub fn providers(&self) -> &[Provider] {
        match &self.provision {
            Provision::Providers(providers) => providers,
            _ => &[],
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.provision != Provision::Unsatisfied
    }
}

/// Outcome of resolving one bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub bundle: ModuleId,
    pub strategy: RequirementStrategy,
    /// Every explicit and implicit requirement, in resolution order.
    pub requirements: Vec<ResolvedRequirement>,
    /// Whether every requirement, optional ones included, was met.
    pub satisfied: bool,
    /// Packages imported implicitly through `Require-Bundle`.
    pub reexported_packages: Vec<String>,
}

impl ResolutionResult {
    pub fn unsatisfied(&self) -> impl Iterator<Item = &ResolvedRequirement> {
        self.requirements.iter().filter(|r| !r.is_satisfied())
    }

    /// Resolved requirements on `name` (package or bundle).
    pub fn requirement(&self, name: &str) -> impl Iterator<Item = &ResolvedRequirement> {
        self.requirements
            .iter()
            .filter(move |r| r.requirement.name == name)
    }
}

/// Resolve `bundle`'s requirements against `index`.
pub fn resolve(
    bundle: &BundleDescriptor,
    index: &CapabilityIndex,
    options: &ResolveOptions,
) -> Result<ResolutionResult> {
    let _span = tracing::debug_span!("resolve", bundle = %bundle, strategy = %options.strategy)
        .entered();

    let mut resolver = Resolver {
        bundle,
        index,
        options,
        requirements: Vec::new(),
        reexported: Vec::new(),
        visited: BTreeMap::new(),
    };
    resolver
        .visited
        .insert((bundle.symbolic_name().to_string(), bundle.version().clone()), Tier::Mandatory);

    for import in bundle.imports() {
        let requirement = Requirement {
            kind: RequirementKind::Package,
            name: import.package.clone(),
            range: import.range.clone(),
            resolution: import.resolution,
            origin: Origin::Declared,
        };
        let provision = if self_provides(bundle, &requirement) {
            Provision::SelfProvided
        } else if options.is_system_package(&import.package) {
            Provision::System
        } else {
            resolver.match_package(&requirement)?
        };
        resolver.record(requirement, Tier::declared(import.resolution), provision)?;
    }

    for require in bundle.requires() {
        let requirement = Requirement {
            kind: RequirementKind::Bundle,
            name: require.symbolic_name.clone(),
            range: require.range.clone(),
            resolution: require.resolution,
            origin: Origin::Declared,
        };
        let tier = Tier::declared(require.resolution);
        resolver.require_bundle(requirement, tier)?;
    }

    let satisfied = resolver.requirements.iter().all(ResolvedRequirement::is_satisfied);
    Ok(ResolutionResult {
        bundle: ModuleId::of(bundle),
        strategy: options.strategy,
        requirements: resolver.requirements,
        satisfied,
        reexported_packages: resolver.reexported,
    })
}

struct Resolver<'a> {
    bundle: &'a BundleDescriptor,
    index: &'a CapabilityIndex,
    options: &'a ResolveOptions,
    requirements: Vec<ResolvedRequirement>,
    reexported: Vec<String>,
    /// Bundles whose packages were already passed on, with the strongest
    /// tier they were passed on at.
    visited: BTreeMap<(String, Version), Tier>,
}

impl<'a> Resolver<'a> {
    fn match_package(&self, requirement: &Requirement) -> Result<Provision> {
        let candidates: Vec<Provider> = self
            .index
            .find_package_providers(&requirement.name)
            .into_iter()
            .filter(|p| requirement.range.contains(p.version))
            .map(|p| Provider::new(p.bundle, p.version.clone()))
            .collect();
        let chosen = self.choose(requirement, candidates, |p| p.module.to_string())?;
        Ok(provision_of(chosen))
    }

    fn match_bundle(&self, requirement: &Requirement) -> Result<Vec<&'a BundleDescriptor>> {
        let candidates: Vec<&'a BundleDescriptor> = self
            .index
            .find_bundle_providers(&requirement.name)
            .into_iter()
            .filter(|b| requirement.range.contains(b.version()))
            .collect();
        self.choose(requirement, candidates, |b| b.to_string())
    }

    fn choose<T>(
        &self,
        requirement: &Requirement,
        candidates: Vec<T>,
        label: impl Fn(&T) -> String,
    ) -> Result<Vec<T>> {
        match self.options.strategy {
            RequirementStrategy::First => Ok(candidates.into_iter().take(1).collect()),
            RequirementStrategy::NoAmbiguity if candidates.len() > 1 => {
                Err(Error::AmbiguousRequirement {
                    requirement: requirement.subject(),
                    range: requirement.range.to_string(),
                    candidates: candidates.iter().map(label).collect(),
                })
            }
            RequirementStrategy::NoAmbiguity | RequirementStrategy::All => Ok(candidates),
        }
    }

    fn require_bundle(&mut self, requirement: Requirement, tier: Tier) -> Result<()> {
        let chosen = self.match_bundle(&requirement)?;
        let provision = provision_of(
            chosen
                .iter()
                .map(|b| Provider::new(b, b.version().clone()))
                .collect(),
        );
        self.record(requirement, tier, provision)?;

        let implied = tier.through(Resolution::Mandatory);
        for provider in chosen {
            self.reexport(provider, implied)?;
        }
        Ok(())
    }

    /// Pass `provider`'s packages, and those of its re-exported required
    /// bundles, on to the bundle being resolved.
    fn reexport(&mut self, provider: &'a BundleDescriptor, tier: Tier) -> Result<()> {
        let key = (provider.symbolic_name().to_string(), provider.version().clone());
        if self.visited.get(&key).is_some_and(|&seen| seen <= tier) {
            return Ok(());
        }
        self.visited.insert(key, tier);

        for export in provider.exports() {
            let requirement = Requirement {
                kind: RequirementKind::Package,
                name: export.package.clone(),
                range: VersionRange::exact(export.version.clone()),
                resolution: tier.resolution(),
                origin: Origin::Reexported {
                    via: provider.symbolic_name().to_string(),
                },
            };
            let provision = if self_provides(self.bundle, &requirement) {
                Provision::SelfProvided
            } else {
                Provision::Providers(vec![Provider::new(provider, export.version.clone())])
            };
            if !self.reexported.contains(&export.package) {
                self.reexported.push(export.package.clone());
            }
            self.record(requirement, tier, provision)?;
        }

        for require in provider.requires().iter().filter(|r| r.reexport) {
            let requirement = Requirement {
                kind: RequirementKind::Bundle,
                name: require.symbolic_name.clone(),
                range: require.range.clone(),
                resolution: require.resolution,
                origin: Origin::Reexported {
                    via: provider.symbolic_name().to_string(),
                },
            };
            self.require_bundle(requirement, tier.through(require.resolution))?;
        }
        Ok(())
    }

    fn record(&mut self, requirement: Requirement, tier: Tier, provision: Provision) -> Result<()> {
        match &provision {
            Provision::Unsatisfied if tier == Tier::Mandatory => {
                return Err(Error::UnresolvedRequirement {
                    requirement: requirement.subject(),
                    range: requirement.range.to_string(),
                });
            }
            Provision::Unsatisfied => {
                tracing::warn!(
                    bundle = %self.bundle,
                    requirement = %requirement,
                    "Optional requirement has no provider"
                );
            }
            Provision::Providers(providers) => {
                tracing::debug!(
                    requirement = %requirement,
                    tier = tier.configuration(),
                    providers = ?providers.iter().map(|p| p.module.to_string()).collect::<Vec<_>>(),
                    "Matched requirement"
                );
            }
            Provision::SelfProvided | Provision::System => {
                tracing::trace!(requirement = %requirement, provision = ?provision, "Requirement needs no provider");
            }
        }

        self.requirements.push(ResolvedRequirement {
            requirement,
            tier,
            provision,
        });
        Ok(())
    }
}

/// Whether `bundle` exports the required package at a version in range.
fn self_provides(bundle: &BundleDescriptor, requirement: &Requirement) -> bool {
    bundle
        .export(&requirement.name)
        .is_some_and(|export| requirement.range.contains(&export.version))
}

fn provision_of(providers: Vec<Provider>) -> Provision {
    if providers.is_empty() {
        Provision::Unsatisfied
    } else {
        Provision::Providers(providers)
    }
}
