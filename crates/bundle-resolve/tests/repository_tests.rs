use std::fs;

use bundle_manifest::Version;
use bundle_resolve::{
    BundleRepoResolver, CONF_DEFAULT, CONF_OPTIONAL, DependencyRequest, DependencyResolver, Error,
    RequirementStrategy, ResolverConfig, Tier,
};
use bundle_test_utils::TestBundleRepo;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn ambiguous_repo() -> TestBundleRepo {
    let mut repo = TestBundleRepo::new();
    repo.add_bundle("Bundle-SymbolicName: one\nBundle-Version: 1.0\nExport-Package: api;version=1.0\n")
        .add_bundle("Bundle-SymbolicName: two\nBundle-Version: 1.0\nExport-Package: api;version=1.5\n")
        .add_bundle("Bundle-SymbolicName: app\nBundle-Version: 1.0\nImport-Package: api\n");
    repo
}

fn app() -> DependencyRequest {
    DependencyRequest::new("app", Version::new(1, 0, 0))
}

#[rstest]
#[case::first(RequirementStrategy::First, Some(vec!["one"]))]
#[case::all(RequirementStrategy::All, Some(vec!["one", "two"]))]
#[case::noambiguity(RequirementStrategy::NoAmbiguity, None)]
fn strategy_decides_providers(#[case] strategy: RequirementStrategy, #[case] expected: Option<Vec<&str>>) {
    let repo = ambiguous_repo();
    let resolver = repo.resolver().with_strategy(strategy);

    match (resolver.get_dependency(&app()), expected) {
        (Ok(Some(revision)), Some(expected)) => {
            let targets: Vec<&str> = revision
                .descriptor
                .dependencies
                .iter()
                .map(|d| d.target.name.as_str())
                .collect();
            assert_eq!(targets, expected);
        }
        (Err(Error::AmbiguousRequirement { candidates, .. }), None) => {
            assert_eq!(candidates, vec!["one;1.0.0", "two;1.0.0"]);
        }
        (other, expected) => panic!("unexpected {other:?} for {expected:?}"),
    }
}

#[test]
fn resolver_from_config_file() {
    let repo = ambiguous_repo();
    let config_path = repo.root().join("resolver.toml");
    fs::write(
        &config_path,
        format!(
            "name = \"configured\"\nstrategy = \"first\"\nrepository = \"file://{}\"\ncache_dir = \"{}\"\n",
            repo.listing_path().display(),
            repo.cache_dir().display()
        ),
    )
    .unwrap();

    let config = ResolverConfig::load(&config_path).unwrap();
    let resolver = BundleRepoResolver::from_config(&config).unwrap();
    assert_eq!(resolver.name(), "configured");

    let revision = resolver.get_dependency(&app()).unwrap().unwrap();
    assert_eq!(revision.resolver, "configured");
    assert_eq!(revision.descriptor.dependencies[0].target.name, "one");
}

#[test]
fn optional_require_bundle_pulls_reexports_transitively_only() {
    let mut repo = TestBundleRepo::new();
    repo.add_bundle("Bundle-SymbolicName: core\nBundle-Version: 1.0\nExport-Package: core.api\n")
        .add_bundle(
            "Bundle-SymbolicName: facade\nBundle-Version: 1.0\nExport-Package: facade.api\n\
             Require-Bundle: core;visibility:=reexport\n",
        )
        .add_bundle(
            "Bundle-SymbolicName: app\nBundle-Version: 1.0\n\
             Require-Bundle: facade;resolution:=optional\n",
        );
    let resolver = repo.resolver();
    let module = resolver.get_dependency(&app()).unwrap().unwrap().descriptor;

    assert_eq!(module.dependency("facade").unwrap().tier, Tier::Optional);
    assert_eq!(module.dependency("core").unwrap().tier, Tier::TransitiveOptional);
    assert!(module.dependencies_for(CONF_DEFAULT).is_empty());
    let optional: Vec<&str> = module
        .dependencies_for(CONF_OPTIONAL)
        .into_iter()
        .map(|(edge, _)| edge.target.name.as_str())
        .collect();
    assert_eq!(optional, vec!["facade"]);
}

#[test]
fn system_packages_are_configurable() {
    let mut repo = TestBundleRepo::new();
    repo.add_bundle(
        "Bundle-SymbolicName: app\nBundle-Version: 1.0\nImport-Package: javax.xml.parsers\n",
    );

    let strict = repo.resolver();
    assert!(matches!(
        strict.get_dependency(&app()),
        Err(Error::UnresolvedRequirement { .. })
    ));

    let lenient = repo.resolver().with_system_packages(["java.*", "javax.*"]);
    let module = lenient.get_dependency(&app()).unwrap().unwrap().descriptor;
    assert!(module.dependencies.is_empty());
}
