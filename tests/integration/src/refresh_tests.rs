//! Index loading and refresh while resolutions are running.

use std::fs;
use std::thread;

use bundle_manifest::Version;
use bundle_resolve::{DependencyRequest, DependencyResolver, Error};
use bundle_test_utils::TestBundleRepo;

const BASE: &str = "Bundle-SymbolicName: base\nBundle-Version: 1.0.0\nExport-Package: base.api\n";
const APP: &str = "Bundle-SymbolicName: app\nBundle-Version: 2.0.0\nImport-Package: base.api\n";
const EXTRA: &str = "Bundle-SymbolicName: extra\nBundle-Version: 1.0.0\nImport-Package: base.api\n";

fn request(name: &str, major: u64) -> DependencyRequest {
    DependencyRequest::new(name, Version::new(major, 0, 0))
}

#[test]
fn index_is_loaded_once_until_refreshed() {
    let mut repo = TestBundleRepo::new();
    repo.add_bundle(BASE).add_bundle(APP);
    let resolver = repo.resolver();

    assert!(resolver.get_dependency(&request("extra", 1)).unwrap().is_none());

    repo.add_bundle(EXTRA);
    assert!(
        resolver.get_dependency(&request("extra", 1)).unwrap().is_none(),
        "listing changes are invisible before a refresh"
    );

    let index = resolver.refresh().unwrap();
    assert_eq!(index.len(), 3);
    assert!(resolver.get_dependency(&request("extra", 1)).unwrap().is_some());
}

#[test]
fn failed_refresh_keeps_previous_index() {
    let mut repo = TestBundleRepo::new();
    repo.add_bundle(BASE).add_bundle(APP);
    let resolver = repo.resolver();
    assert!(resolver.get_dependency(&request("app", 2)).unwrap().is_some());

    fs::write(repo.listing_path(), "[[bundle]\n").unwrap();
    assert!(matches!(resolver.refresh(), Err(Error::ListingParse { .. })));
    assert!(resolver.get_dependency(&request("app", 2)).unwrap().is_some());
}

#[test]
fn removed_provider_fails_mandatory_import_after_refresh() {
    let mut repo = TestBundleRepo::new();
    repo.add_bundle(BASE).add_bundle(APP);
    let resolver = repo.resolver();
    assert!(resolver.get_dependency(&request("app", 2)).unwrap().is_some());

    repo.remove_bundle("base");
    resolver.refresh().unwrap();
    assert!(matches!(
        resolver.get_dependency(&request("app", 2)),
        Err(Error::UnresolvedRequirement { requirement, .. }) if requirement == "package base.api"
    ));
}

#[test]
fn concurrent_resolutions_see_whole_indexes() {
    let mut repo = TestBundleRepo::new();
    repo.add_bundle(BASE).add_bundle(APP);
    let resolver = repo.resolver();
    resolver.index().unwrap();

    thread::scope(|scope| {
        let readers: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    for _ in 0..50 {
                        let revision = resolver
                            .get_dependency(&request("app", 2))
                            .unwrap()
                            .unwrap();
                        assert_eq!(revision.descriptor.dependencies.len(), 1);
                        assert_eq!(revision.descriptor.dependencies[0].target.name, "base");
                    }
                })
            })
            .collect();

        for _ in 0..20 {
            let index = resolver.refresh().unwrap();
            assert_eq!(index.len(), 2);
        }

        for reader in readers {
            reader.join().unwrap();
        }
    });
}
