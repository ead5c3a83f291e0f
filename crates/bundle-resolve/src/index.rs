//! Capability index over a repository listing.
//!
//! Bundles live in an arena in listing order; the package and symbolic-name
//! maps hold arena positions. Every lookup returns providers in listing
//! order, which is the tie-break the `first` strategy relies on.
//!
//! [`IndexHandle`] publishes a fully built index with a single atomic store
//! so concurrent resolutions see either the old or the new index, never a
//! partially built one.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use bundle_manifest::{BundleDescriptor, Version};

/// A bundle as listed in a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedBundle {
    descriptor: BundleDescriptor,
    location: Option<String>,
}

impl IndexedBundle {
    pub fn new(descriptor: BundleDescriptor, location: Option<String>) -> Self {
        Self {
            descriptor,
            location,
        }
    }

    pub fn descriptor(&self) -> &BundleDescriptor {
        &self.descriptor
    }

    /// Where the bundle's artifact can be fetched from.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

/// One exporter of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageProvider<'a> {
    pub bundle: &'a BundleDescriptor,
    /// The version the package is exported at.
    pub version: &'a Version,
}

/// Read-only lookup of who provides which package and bundle.
#[derive(Debug, Default)]
pub struct CapabilityIndex {
    bundles: Vec<IndexedBundle>,
    /// package -> (bundle position, export position)
    packages: HashMap<String, Vec<(usize, usize)>>,
    /// symbolic name -> bundle positions
    names: HashMap<String, Vec<usize>>,
}

impl CapabilityIndex {
    /// Index bundle descriptors that have no artifact location.
    pub fn build<I>(bundles: I) -> Self
    where
        I: IntoIterator<Item = BundleDescriptor>,
    {
        Self::from_entries(bundles.into_iter().map(|d| IndexedBundle::new(d, None)))
    }

    /// Index listing entries, preserving their order.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = IndexedBundle>,
    {
        let mut index = Self::default();
        for entry in entries {
            let position = index.bundles.len();
            let descriptor = &entry.descriptor;

            let same_name = index
                .names
                .entry(descriptor.symbolic_name().to_string())
                .or_default();
            if same_name
                .iter()
                .any(|&p| index.bundles[p].descriptor.version() == descriptor.version())
            {
                tracing::warn!(
                    bundle = %descriptor,
                    "Bundle listed more than once; the first listing wins"
                );
            }
            same_name.push(position);

            for (export_position, export) in descriptor.exports().iter().enumerate() {
                index
                    .packages
                    .entry(export.package.clone())
                    .or_default()
                    .push((position, export_position));
            }

            index.bundles.push(entry);
        }

        tracing::debug!(
            bundles = index.bundles.len(),
            packages = index.packages.len(),
            "Built capability index"
        );
        index
    }

    /// Exporters of `package`, in listing order.
    pub fn find_package_providers(&self, package: &str) -> Vec<PackageProvider<'_>> {
        self.packages
            .get(package)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&(bundle, export)| {
                        let descriptor = &self.bundles[bundle].descriptor;
                        PackageProvider {
                            bundle: descriptor,
                            version: &descriptor.exports()[export].version,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Bundles named `symbolic_name`, in listing order.
    pub fn find_bundle_providers(&self, symbolic_name: &str) -> Vec<&BundleDescriptor> {
        self.names
            .get(symbolic_name)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&p| &self.bundles[p].descriptor)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The listing entry for an exact bundle identity.
    pub fn find_bundle(&self, symbolic_name: &str, version: &Version) -> Option<&IndexedBundle> {
        self.names.get(symbolic_name).and_then(|positions| {
            positions
                .iter()
                .map(|&p| &self.bundles[p])
                .find(|b| b.descriptor.version() == version)
        })
    }

    pub fn bundles(&self) -> impl Iterator<Item = &IndexedBundle> {
        self.bundles.iter()
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

/// Publication point for the current [`CapabilityIndex`].
///
/// Readers never block; writers build a complete index first and then
/// swap it in.
#[derive(Debug, Default)]
pub struct IndexHandle {
    current: ArcSwapOption<CapabilityIndex>,
}

impl IndexHandle {
    /// A handle with nothing published yet.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A handle publishing `index`.
    pub fn new(index: CapabilityIndex) -> Self {
        let handle = Self::empty();
        handle.publish(index);
        handle
    }

    /// The currently published index, if any.
    pub fn snapshot(&self) -> Option<Arc<CapabilityIndex>> {
        self.current.load_full()
    }

    /// Replace the published index, returning the new one.
    pub fn publish(&self, index: CapabilityIndex) -> Arc<CapabilityIndex> {
        let index = Arc::new(index);
        self.current.store(Some(Arc::clone(&index)));
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_manifest::ExportEntry;

    fn bundle(name: &str, version: Version, exports: &[(&str, Version)]) -> BundleDescriptor {
        exports
            .iter()
            .fold(BundleDescriptor::new(name, version), |b, (pkg, v)| {
                b.with_export(ExportEntry::new(*pkg, v.clone()))
            })
    }

    #[test]
    fn test_package_providers_keep_listing_order() {
        let index = CapabilityIndex::build([
            bundle("zeta", Version::new(1, 0, 0), &[("p", Version::new(2, 0, 0))]),
            bundle("alpha", Version::new(1, 0, 0), &[("p", Version::new(1, 0, 0))]),
        ]);
        let providers = index.find_package_providers("p");
        let names: Vec<&str> = providers.iter().map(|p| p.bundle.symbolic_name()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(providers[0].version, &Version::new(2, 0, 0));
    }

    #[test]
    fn test_bundle_providers_keep_listing_order() {
        let index = CapabilityIndex::build([
            bundle("a", Version::new(2, 0, 0), &[]),
            bundle("b", Version::new(1, 0, 0), &[]),
            bundle("a", Version::new(1, 0, 0), &[]),
        ]);
        let versions: Vec<String> = index
            .find_bundle_providers("a")
            .iter()
            .map(|b| b.version().to_string())
            .collect();
        assert_eq!(versions, vec!["2.0.0", "1.0.0"]);
    }

    #[test]
    fn test_unknown_names_have_no_providers() {
        let index = CapabilityIndex::build([bundle("a", Version::new(1, 0, 0), &[])]);
        assert!(index.find_package_providers("nope").is_empty());
        assert!(index.find_bundle_providers("nope").is_empty());
        assert!(index.find_bundle("a", &Version::new(9, 0, 0)).is_none());
    }

    #[test]
    fn test_find_bundle_exact() {
        let index = CapabilityIndex::from_entries([IndexedBundle::new(
            bundle("a", Version::new(1, 0, 0), &[]),
            Some("jars/a.jar".to_string()),
        )]);
        let found = index.find_bundle("a", &Version::new(1, 0, 0)).unwrap();
        assert_eq!(found.location(), Some("jars/a.jar"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_handle_publish_replaces_snapshot() {
        let handle = IndexHandle::empty();
        assert!(handle.snapshot().is_none());

        handle.publish(CapabilityIndex::build([bundle("a", Version::new(1, 0, 0), &[])]));
        let first = handle.snapshot().unwrap();

        handle.publish(CapabilityIndex::build([
            bundle("a", Version::new(1, 0, 0), &[]),
            bundle("b", Version::new(1, 0, 0), &[]),
        ]));

        // Earlier snapshots stay valid and unchanged.
        assert_eq!(first.len(), 1);
        assert_eq!(handle.snapshot().unwrap().len(), 2);
    }
}
