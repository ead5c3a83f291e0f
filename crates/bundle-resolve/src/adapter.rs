//! Bundle resolution to generic module descriptor.

use bundle_manifest::BundleDescriptor;

use crate::module::{Artifact, Configuration, DependencyEdge, ModuleDescriptor, ModuleId};
use crate::resolver::ResolutionResult;

/// Describe `bundle` as a module whose dependencies are the providers
/// chosen in `resolution`.
///
/// Each provider gets one edge, at the strongest tier any requirement
/// reached it with. Edges keep the order in which providers first appear;
/// the bundle never depends on itself.
pub fn to_module_descriptor(bundle: &BundleDescriptor, resolution: &ResolutionResult) -> ModuleDescriptor {
    let id = ModuleId::of(bundle);

    let mut dependencies: Vec<DependencyEdge> = Vec::new();
    for resolved in &resolution.requirements {
        for provider in resolved.providers() {
            if provider.module == id {
                continue;
            }
            match dependencies.iter_mut().find(|e| e.target == provider.module) {
                Some(edge) if resolved.tier < edge.tier => {
                    *edge = DependencyEdge::new(provider.module.clone(), resolved.tier);
                }
                Some(_) => {}
                None => dependencies.push(DependencyEdge::new(provider.module.clone(), resolved.tier)),
            }
        }
    }

    let unsatisfied = resolution
        .unsatisfied()
        .map(|r| r.requirement.to_string())
        .collect();

    tracing::debug!(
        module = %id,
        dependencies = dependencies.len(),
        "Built module descriptor"
    );

    ModuleDescriptor {
        artifacts: vec![Artifact::jar(id.clone())],
        id,
        configurations: Configuration::standard(),
        dependencies,
        unsatisfied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::CapabilityIndex;
    use crate::module::{CONF_DEFAULT, CONF_OPTIONAL, CONF_TRANSITIVE_OPTIONAL};
    use crate::resolver::{ResolveOptions, Tier, resolve};
    use crate::strategy::RequirementStrategy;
    use pretty_assertions::assert_eq;

    fn describe(root: &str, repository: &[&str]) -> ModuleDescriptor {
        let index = CapabilityIndex::build(
            repository
                .iter()
                .map(|m| BundleDescriptor::parse(m).unwrap()),
        );
        let bundle = BundleDescriptor::parse(root).unwrap();
        let options = ResolveOptions::default().with_strategy(RequirementStrategy::First);
        let resolution = resolve(&bundle, &index, &options).unwrap();
        to_module_descriptor(&bundle, &resolution)
    }

    #[test]
    fn test_one_edge_per_provider_at_strongest_tier() {
        let module = describe(
            "Bundle-SymbolicName: root\n\
             Import-Package: lib.spi;resolution:=optional,lib.api\n",
            &["Bundle-SymbolicName: lib\nBundle-Version: 2.0\nExport-Package: lib.api,lib.spi\n"],
        );
        assert_eq!(module.dependencies.len(), 1);
        assert_eq!(module.dependencies[0].tier, Tier::Mandatory);
        assert_eq!(module.dependencies[0].target.to_string(), "lib;2.0.0");
    }

    #[test]
    fn test_edges_keep_first_appearance_order() {
        let module = describe(
            "Bundle-SymbolicName: root\nImport-Package: z.api,a.api\n",
            &[
                "Bundle-SymbolicName: a\nExport-Package: a.api\n",
                "Bundle-SymbolicName: z\nExport-Package: z.api\n",
            ],
        );
        let order: Vec<&str> = module
            .dependencies
            .iter()
            .map(|d| d.target.name.as_str())
            .collect();
        assert_eq!(order, vec!["z", "a"]);
    }

    #[test]
    fn test_optional_import_only_in_optional_configurations() {
        let module = describe(
            "Bundle-SymbolicName: root\nImport-Package: lib.api;resolution:=optional\n",
            &["Bundle-SymbolicName: lib\nExport-Package: lib.api\n"],
        );
        assert!(module.dependencies_for(CONF_DEFAULT).is_empty());
        assert_eq!(module.dependencies_for(CONF_OPTIONAL).len(), 1);
        assert_eq!(module.dependencies_for(CONF_TRANSITIVE_OPTIONAL).len(), 1);
    }

    #[test]
    fn test_unsatisfied_optional_is_diagnostic() {
        let module = describe(
            "Bundle-SymbolicName: root\nImport-Package: gone;resolution:=optional\n",
            &[],
        );
        assert!(module.dependencies.is_empty());
        assert_eq!(module.unsatisfied, vec!["package gone 0.0.0"]);
    }

    #[test]
    fn test_declares_standard_configurations_and_jar() {
        let module = describe("Bundle-SymbolicName: root\nBundle-Version: 1.0\n", &[]);
        let confs: Vec<&str> = module.configuration_names().collect();
        assert_eq!(confs, vec!["default", "optional", "transitive-optional"]);
        assert_eq!(module.artifacts[0].file_name(), "root-1.0.0.jar");
    }
}
