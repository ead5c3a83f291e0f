//! Bundle repository resolver.
//!
//! [`BundleRepoResolver`] plugs a bundle repository into a generic
//! dependency engine through the [`DependencyResolver`] contract: it looks
//! up a requested module in the repository's capability index, resolves the
//! bundle's requirements, and hands back a [`ModuleDescriptor`].

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use bundle_manifest::{BundleDescriptor, Version};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::adapter::to_module_descriptor;
use crate::config::ResolverConfig;
use crate::download::{ArtifactDownloader, DownloadOptions, DownloadReport, FsArtifactCache};
use crate::error::{Error, Result};
use crate::index::{CapabilityIndex, IndexHandle};
use crate::listing::RepositorySource;
use crate::module::{Artifact, ModuleDescriptor, ModuleId};
use crate::resolver::{ResolutionResult, ResolveOptions, resolve};
use crate::strategy::RequirementStrategy;

/// A request for one module revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyRequest {
    pub id: ModuleId,
}

impl DependencyRequest {
    pub fn new(name: impl Into<String>, revision: Version) -> Self {
        Self {
            id: ModuleId::new(name, revision),
        }
    }
}

impl From<ModuleId> for DependencyRequest {
    fn from(id: ModuleId) -> Self {
        Self { id }
    }
}

/// A module descriptor plus where and when it was resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedModuleRevision {
    pub descriptor: ModuleDescriptor,
    pub resolution: ResolutionResult,
    /// Name of the resolver that produced this revision.
    pub resolver: String,
    /// Artifact location from the repository listing.
    pub location: Option<String>,
    pub resolved_at: DateTime<Utc>,
}

impl ResolvedModuleRevision {
    pub fn id(&self) -> &ModuleId {
        &self.descriptor.id
    }
}

/// What a dependency engine needs from a repository.
pub trait DependencyResolver: Send + Sync {
    fn name(&self) -> &str;

    /// Describe the requested module, or `None` if the repository does not
    /// have it.
    fn get_dependency(&self, request: &DependencyRequest) -> Result<Option<ResolvedModuleRevision>>;

    /// Fetch artifacts into the local cache. Per-artifact failures are
    /// reported, not raised.
    fn download(&self, artifacts: &[Artifact], options: &DownloadOptions) -> DownloadReport;
}

/// Resolves modules out of a bundle repository listing.
///
/// The capability index is loaded on first use and then shared; a
/// [`refresh`](Self::refresh) swaps in a new one without disturbing
/// resolutions already running against the old.
pub struct BundleRepoResolver {
    name: String,
    options: ResolveOptions,
    source: Option<RepositorySource>,
    index: IndexHandle,
    load_lock: Mutex<()>,
    downloader: Box<dyn ArtifactDownloader>,
}

impl fmt::Debug for BundleRepoResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleRepoResolver")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("source", &self.source)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl BundleRepoResolver {
    /// A resolver with no repository and the default artifact cache.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: ResolveOptions::default(),
            source: None,
            index: IndexHandle::empty(),
            load_lock: Mutex::new(()),
            downloader: Box::new(FsArtifactCache::default()),
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        let mut resolver = Self::new(config.name.clone());
        resolver.options = config.resolve_options();
        if let Some(repository) = &config.repository {
            resolver.source = Some(RepositorySource::parse(repository)?);
        }
        if let Some(cache_dir) = &config.cache_dir {
            resolver = resolver.with_cache_dir(cache_dir.clone());
        }
        Ok(resolver)
    }

    pub fn with_repository(mut self, source: RepositorySource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_strategy(mut self, strategy: RequirementStrategy) -> Self {
        self.options.strategy = strategy;
        self
    }

    pub fn with_system_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = self.options.with_system_packages(packages);
        self
    }

    pub fn with_cache_dir(self, cache_dir: impl Into<PathBuf>) -> Self {
        self.with_downloader(FsArtifactCache::new(cache_dir))
    }

    pub fn with_downloader(mut self, downloader: impl ArtifactDownloader + 'static) -> Self {
        self.downloader = Box::new(downloader);
        self
    }

    /// Use a prebuilt index instead of loading a listing.
    pub fn with_index(self, index: CapabilityIndex) -> Self {
        self.index.publish(index);
        self
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// The current capability index, loading the listing on first use.
    pub fn index(&self) -> Result<Arc<CapabilityIndex>> {
        if let Some(index) = self.index.snapshot() {
            return Ok(index);
        }
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(index) = self.index.snapshot() {
            return Ok(index);
        }
        self.load()
    }

    /// Reload the listing and publish the new index.
    ///
    /// On failure the previous index stays published.
    pub fn refresh(&self) -> Result<Arc<CapabilityIndex>> {
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.load()
    }

    fn load(&self) -> Result<Arc<CapabilityIndex>> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| Error::NoRepository(self.name.clone()))?;
        let entries = source.load()?;
        let index = self.index.publish(CapabilityIndex::from_entries(entries));
        tracing::info!(
            resolver = %self.name,
            source = %source,
            bundles = index.len(),
            "Published capability index"
        );
        Ok(index)
    }

    /// Resolve any bundle, listed or not, against the repository with an
    /// explicit set of options.
    pub fn resolve_bundle(
        &self,
        bundle: &BundleDescriptor,
        options: &ResolveOptions,
    ) -> Result<ResolutionResult> {
        let index = self.index()?;
        resolve(bundle, &index, options)
    }

    /// Describe any bundle, listed or not, as a module with this
    /// resolver's options.
    pub fn describe(&self, bundle: &BundleDescriptor) -> Result<ModuleDescriptor> {
        let resolution = self.resolve_bundle(bundle, &self.options)?;
        Ok(to_module_descriptor(bundle, &resolution))
    }
}

impl DependencyResolver for BundleRepoResolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_dependency(&self, request: &DependencyRequest) -> Result<Option<ResolvedModuleRevision>> {
        let index = self.index()?;
        let Some(entry) = index.find_bundle(&request.id.name, &request.id.revision) else {
            tracing::debug!(resolver = %self.name, module = %request.id, "Module not in repository");
            return Ok(None);
        };

        let resolution = resolve(entry.descriptor(), &index, &self.options)?;
        let descriptor =
            to_module_descriptor(entry.descriptor(), &resolution).with_artifact_location(entry.location());

        Ok(Some(ResolvedModuleRevision {
            descriptor,
            resolution,
            resolver: self.name.clone(),
            location: entry.location().map(str::to_string),
            resolved_at: Utc::now(),
        }))
    }

    fn download(&self, artifacts: &[Artifact], options: &DownloadOptions) -> DownloadReport {
        self.downloader.download_all(artifacts, options)
    }
}
