//! End-to-end resolution over the fixture bundle repository.
//!
//! Each scenario resolves one listed bundle, then walks its configuration
//! closure the way a dependency engine would and compares the set of
//! modules reached.

use std::collections::BTreeSet;

use bundle_manifest::Version;
use bundle_resolve::{
    BundleRepoResolver, DependencyRequest, DependencyResolver, DownloadOptions, DownloadStatus,
    Error, RepositorySource, RequirementStrategy, ResolvedModuleRevision,
};
use bundle_test_utils::{fixture_repository, resolve_closure};
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::TempDir;

const BASE: &str = "com.example.base;1.2.3";
const IMPORTING: &str = "com.example.importing;3.2.1";
const IMPORTING_VERSION: &str = "com.example.importing.version;3.2.1";
const IMPORTING_OPTIONAL: &str = "com.example.importing.optional;3.2.1";
const USE: &str = "com.example.use;2.2.2";
const EXPORTING_AMBIGUITY: &str = "com.example.exporting.ambiguity;3.3.3";
const FACADE: &str = "com.example.facade;2.0.0";

struct Fixture {
    resolver: BundleRepoResolver,
    _cache: TempDir,
}

fn fixture(strategy: RequirementStrategy) -> Fixture {
    let cache = TempDir::new().unwrap();
    let resolver = BundleRepoResolver::new("bundlerepo")
        .with_repository(RepositorySource::new(fixture_repository()))
        .with_strategy(strategy)
        .with_cache_dir(cache.path());
    Fixture {
        resolver,
        _cache: cache,
    }
}

fn request(name: &str, version: &str) -> DependencyRequest {
    DependencyRequest::new(name, Version::parse(version).unwrap())
}

fn revision(resolver: &BundleRepoResolver, name: &str, version: &str) -> ResolvedModuleRevision {
    resolver
        .get_dependency(&request(name, version))
        .unwrap()
        .unwrap_or_else(|| panic!("{name};{version} not in fixture repository"))
}

fn closure(resolver: &BundleRepoResolver, name: &str, version: &str, conf: &str) -> BTreeSet<String> {
    let root = revision(resolver, name, version);
    resolve_closure(resolver, &root.descriptor, conf)
        .unwrap()
        .into_iter()
        .map(|m| m.to_string())
        .collect()
}

fn set(modules: &[&str]) -> BTreeSet<String> {
    modules.iter().map(|m| m.to_string()).collect()
}

#[test]
fn simple_resolve_and_download() {
    let fixture = fixture(RequirementStrategy::NoAmbiguity);
    let base = revision(&fixture.resolver, "com.example.base", "1.2.3");

    assert_eq!(base.id().to_string(), BASE);
    assert_eq!(base.resolver, "bundlerepo");
    assert!(base.descriptor.dependencies.is_empty());
    let artifacts = base.descriptor.artifacts.clone();
    assert_eq!(artifacts.len(), 1);
    assert!(
        artifacts[0]
            .location
            .as_deref()
            .unwrap()
            .ends_with("com.example.base_1.2.3.jar")
    );

    let report = fixture.resolver.download(&artifacts, &DownloadOptions::default());
    let first = report.artifact_report(&artifacts[0]).unwrap();
    assert_eq!(first.status, DownloadStatus::Successful);
    assert!(first.local_path.as_ref().unwrap().is_file());
    assert!(first.checksum.as_deref().unwrap().starts_with("sha256:"));

    let report = fixture.resolver.download(&artifacts, &DownloadOptions::default());
    assert_eq!(
        report.artifact_report(&artifacts[0]).unwrap().status,
        DownloadStatus::NoTransfer
    );
}

#[rstest]
#[case::importing("com.example.importing", "3.2.1", "default", &[BASE])]
#[case::importing_version("com.example.importing.version", "3.2.1", "default", &[BASE])]
#[case::importing_rangeversion("com.example.importing.rangeversion", "3.2.1", "default", &[BASE])]
#[case::use_only_declares_uses("com.example.use", "2.2.2", "default", &[])]
#[case::importing_use("com.example.importing.use", "3.2.1", "default", &[USE, IMPORTING, BASE])]
#[case::optional_default("com.example.importing.optional", "3.2.1", "default", &[])]
#[case::optional_optional("com.example.importing.optional", "3.2.1", "optional", &[BASE])]
#[case::optional_transitive("com.example.importing.optional", "3.2.1", "transitive-optional", &[BASE])]
#[case::transitive_default("com.example.importing.transitiveoptional", "3.2.1", "default", &[])]
#[case::transitive_optional(
    "com.example.importing.transitiveoptional",
    "3.2.1",
    "optional",
    &[IMPORTING_OPTIONAL]
)]
#[case::transitive_transitive(
    "com.example.importing.transitiveoptional",
    "3.2.1",
    "transitive-optional",
    &[BASE, IMPORTING_OPTIONAL]
)]
#[case::require("com.example.require", "1.1.1", "default", &[BASE, IMPORTING_VERSION])]
#[case::require_optional_conf("com.example.require", "1.1.1", "optional", &[BASE, IMPORTING_VERSION])]
#[case::require_narrowed_range(
    "com.example.require.ambiguity",
    "1.1.1",
    "default",
    &[BASE, IMPORTING_VERSION]
)]
#[case::reexport("com.example.client", "1.0.0", "default", &[FACADE, BASE])]
fn resolves_configuration_closure(
    #[case] name: &str,
    #[case] version: &str,
    #[case] conf: &str,
    #[case] expected: &[&str],
) {
    let fixture = fixture(RequirementStrategy::NoAmbiguity);
    assert_eq!(closure(&fixture.resolver, name, version, conf), set(expected));
}

#[test]
fn import_ambiguity_first_takes_listing_order() {
    let fixture = fixture(RequirementStrategy::First);
    assert_eq!(
        closure(&fixture.resolver, "com.example.importing.ambiguity", "3.2.1", "default"),
        set(&[EXPORTING_AMBIGUITY])
    );
}

#[test]
fn import_ambiguity_noambiguity_fails() {
    let fixture = fixture(RequirementStrategy::NoAmbiguity);
    let err = fixture
        .resolver
        .get_dependency(&request("com.example.importing.ambiguity", "3.2.1"))
        .unwrap_err();
    match err {
        Error::AmbiguousRequirement {
            requirement,
            candidates,
            ..
        } => {
            assert_eq!(requirement, "package com.example.ambiguous");
            assert_eq!(
                candidates,
                vec![
                    EXPORTING_AMBIGUITY.to_string(),
                    "com.example.exporting.ambiguity.alt;1.0.0".to_string(),
                ]
            );
        }
        other => panic!("expected ambiguity, got {other}"),
    }
}

#[test]
fn import_ambiguity_all_keeps_both_providers() {
    let fixture = fixture(RequirementStrategy::All);
    let revision = revision(&fixture.resolver, "com.example.importing.ambiguity", "3.2.1");
    assert_eq!(revision.descriptor.dependencies.len(), 2);
}

#[test]
fn require_bundle_reexports_packages() {
    let fixture = fixture(RequirementStrategy::NoAmbiguity);
    let client = revision(&fixture.resolver, "com.example.client", "1.0.0");
    assert_eq!(
        client.resolution.reexported_packages,
        vec!["com.example.facade", "com.example.base"]
    );
    assert!(client.resolution.satisfied);
}

#[test]
fn system_packages_need_no_provider() {
    let fixture = fixture(RequirementStrategy::NoAmbiguity);
    let importing_use = revision(&fixture.resolver, "com.example.importing.use", "3.2.1");
    let targets: Vec<String> = importing_use
        .descriptor
        .dependencies
        .iter()
        .map(|d| d.target.to_string())
        .collect();
    assert_eq!(targets, vec![USE.to_string(), IMPORTING.to_string()]);
}

#[test]
fn unknown_module_is_not_found() {
    let fixture = fixture(RequirementStrategy::NoAmbiguity);
    assert!(
        fixture
            .resolver
            .get_dependency(&request("com.example.base", "9.9.9"))
            .unwrap()
            .is_none()
    );
    assert!(
        fixture
            .resolver
            .get_dependency(&request("com.example.nowhere", "1.0.0"))
            .unwrap()
            .is_none()
    );
}

#[test]
fn resolution_is_repeatable() {
    let fixture = fixture(RequirementStrategy::NoAmbiguity);
    let first = revision(&fixture.resolver, "com.example.importing.use", "3.2.1");
    let second = revision(&fixture.resolver, "com.example.importing.use", "3.2.1");
    assert_eq!(first.descriptor, second.descriptor);
    assert_eq!(first.resolution, second.resolution);
}
