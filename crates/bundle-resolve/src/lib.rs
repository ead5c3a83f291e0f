//! OSGi requirement/capability resolution against a bundle repository.
//!
//! Layering:
//!
//! - [`listing`] reads a repository listing into bundle descriptors.
//! - [`index`] builds the immutable [`CapabilityIndex`] and publishes it.
//! - [`resolver`] matches a bundle's imports and required bundles against
//!   the index under a [`RequirementStrategy`].
//! - [`adapter`] turns the result into a generic [`ModuleDescriptor`] with
//!   `default`, `optional` and `transitive-optional` configurations.
//! - [`repository`] wires it together behind the [`DependencyResolver`]
//!   contract, with [`download`] fetching artifacts into a local cache.
//!
//! # Example
//!
//! ```
//! use bundle_manifest::BundleDescriptor;
//! use bundle_resolve::{CapabilityIndex, RequirementStrategy, ResolveOptions, resolve};
//!
//! let index = CapabilityIndex::build([BundleDescriptor::parse(
//!     "Bundle-SymbolicName: com.example.base\n\
//!      Bundle-Version: 1.2.3\n\
//!      Export-Package: com.example.base;version=1.2.3\n",
//! )
//! .unwrap()]);
//!
//! let app = BundleDescriptor::parse(
//!     "Bundle-SymbolicName: com.example.app\n\
//!      Import-Package: com.example.base;version=\"[1.0,2.0)\"\n",
//! )
//! .unwrap();
//!
//! let options = ResolveOptions::default().with_strategy(RequirementStrategy::First);
//! let result = resolve(&app, &index, &options).unwrap();
//! assert!(result.satisfied);
//! assert_eq!(result.requirements[0].providers()[0].module.to_string(), "com.example.base;1.2.3");
//! ```

pub mod adapter;
pub mod config;
pub mod download;
pub mod error;
pub mod index;
pub mod listing;
pub mod logging;
pub mod module;
pub mod repository;
pub mod resolver;
pub mod strategy;

pub use adapter::to_module_descriptor;
pub use config::ResolverConfig;
pub use download::{
    ArtifactDownloadReport, ArtifactDownloader, DownloadOptions, DownloadReport, DownloadStatus,
    FsArtifactCache,
};
pub use error::{Error, Result};
pub use index::{CapabilityIndex, IndexHandle, IndexedBundle, PackageProvider};
pub use listing::{RepositorySource, load_listing};
pub use module::{
    Artifact, CONF_DEFAULT, CONF_OPTIONAL, CONF_TRANSITIVE_OPTIONAL, Configuration, DependencyEdge,
    ModuleDescriptor, ModuleId,
};
pub use repository::{BundleRepoResolver, DependencyRequest, DependencyResolver, ResolvedModuleRevision};
pub use resolver::{
    Origin, Provider, Provision, Requirement, RequirementKind, ResolutionResult, ResolveOptions,
    ResolvedRequirement, Tier, resolve,
};
pub use strategy::RequirementStrategy;
