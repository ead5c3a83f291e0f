//! Configuration closure, as a dependency engine computes it.

use std::collections::BTreeSet;

use bundle_resolve::{DependencyRequest, DependencyResolver, ModuleDescriptor, ModuleId};

#[derive(Debug, thiserror::Error)]
pub enum ClosureError {
    #[error(transparent)]
    Resolve(#[from] bundle_resolve::Error),

    #[error("module {module} not found")]
    Missing { module: ModuleId },
}

/// Every module `root` transitively depends on in configuration `conf`,
/// in discovery order and without `root` itself.
///
/// Each edge is followed into the dependee configuration its mapping
/// names, so `optional` on the root only pulls the `default` closure of
/// its optional providers.
pub fn resolve_closure(
    resolver: &dyn DependencyResolver,
    root: &ModuleDescriptor,
    conf: &str,
) -> Result<Vec<ModuleId>, ClosureError> {
    let mut modules = Vec::new();
    let mut visited = BTreeSet::new();
    visit(resolver, root, conf, &mut visited, &mut modules)?;
    modules.retain(|m| m != &root.id);
    Ok(modules)
}

fn visit(
    resolver: &dyn DependencyResolver,
    module: &ModuleDescriptor,
    conf: &str,
    visited: &mut BTreeSet<(ModuleId, String)>,
    modules: &mut Vec<ModuleId>,
) -> Result<(), ClosureError> {
    if !visited.insert((module.id.clone(), conf.to_string())) {
        return Ok(());
    }
    for (edge, target_conf) in module.dependencies_for(conf) {
        let revision = resolver
            .get_dependency(&DependencyRequest::from(edge.target.clone()))?
            .ok_or_else(|| ClosureError::Missing {
                module: edge.target.clone(),
            })?;
        if !modules.contains(&edge.target) {
            modules.push(edge.target.clone());
        }
        visit(resolver, &revision.descriptor, target_conf, visited, modules)?;
    }
    Ok(())
}
