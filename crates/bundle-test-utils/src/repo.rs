//! [`TestBundleRepo`] builder for repository scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use bundle_manifest::BundleDescriptor;
use bundle_resolve::{BundleRepoResolver, RepositorySource};
use tempfile::TempDir;

/// Listing of the checked-in fixture repository under `test-fixtures/`.
pub fn fixture_repository() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../test-fixtures/bundlerepo/repo.toml")
}

/// A temporary bundle repository: manifests, placeholder jars and a
/// `repo.toml` listing.
///
/// # Example
///
/// ```rust,no_run
/// use bundle_test_utils::TestBundleRepo;
///
/// let mut repo = TestBundleRepo::new();
/// repo.add_bundle("Bundle-SymbolicName: a\nBundle-Version: 1.0\nExport-Package: a\n");
/// let resolver = repo.resolver();
/// ```
pub struct TestBundleRepo {
    temp_dir: TempDir,
    entries: Vec<String>,
}

impl Default for TestBundleRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBundleRepo {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
            entries: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn listing_path(&self) -> PathBuf {
        self.root().join("repo.toml")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root().join("cache")
    }

    /// Add a bundle with a placeholder jar and rewrite the listing.
    ///
    /// # Panics
    /// Panics if `manifest` does not describe a bundle.
    pub fn add_bundle(&mut self, manifest: &str) -> &mut Self {
        let bundle = BundleDescriptor::parse(manifest)
            .unwrap_or_else(|e| panic!("TestBundleRepo::add_bundle: {e}"));
        let stem = format!("{}-{}", bundle.symbolic_name(), bundle.version());

        let manifest_file = format!("manifests/{stem}.MF");
        let jar = format!("jars/{stem}.jar");
        self.write(&manifest_file, manifest);
        self.write(&jar, &format!("jar:{bundle}"));

        self.entries.push(format!(
            "[[bundle]]\nlocation = \"{jar}\"\nmanifest_file = \"{manifest_file}\"\n"
        ));
        self.write_listing();
        self
    }

    /// Remove every listed bundle named `symbolic_name` from the listing.
    pub fn remove_bundle(&mut self, symbolic_name: &str) -> &mut Self {
        let prefix = format!("location = \"jars/{symbolic_name}-");
        self.entries.retain(|entry| !entry.contains(&prefix));
        self.write_listing();
        self
    }

    /// A resolver over this repository, caching into [`cache_dir`](Self::cache_dir).
    pub fn resolver(&self) -> BundleRepoResolver {
        BundleRepoResolver::new("test")
            .with_repository(RepositorySource::new(self.listing_path()))
            .with_cache_dir(self.cache_dir())
    }

    fn write_listing(&self) {
        fs::write(self.listing_path(), self.entries.join("\n")).unwrap();
    }

    fn write(&self, relative: &str, content: &str) {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}
