//! Resolver configuration.
//!
//! ```toml
//! name = "bundles"
//! strategy = "first"
//! system_packages = ["java.*", "javax.*"]
//! repository = "repo/repo.toml"
//! cache_dir = "/var/cache/bundles"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::resolver::{DEFAULT_SYSTEM_PACKAGES, ResolveOptions};
use crate::strategy::RequirementStrategy;

/// Settings of a [`BundleRepoResolver`](crate::BundleRepoResolver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Name reported on resolved revisions.
    pub name: String,
    pub strategy: RequirementStrategy,
    pub system_packages: Vec<String>,
    /// Listing path or `file://` URL.
    pub repository: Option<String>,
    /// Artifact cache root; the platform cache directory when unset.
    pub cache_dir: Option<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            name: "bundle".to_string(),
            strategy: RequirementStrategy::default(),
            system_packages: DEFAULT_SYSTEM_PACKAGES.iter().map(|p| p.to_string()).collect(),
            repository: None,
            cache_dir: None,
        }
    }
}

impl ResolverConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml(&content)
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            strategy: self.strategy,
            system_packages: self.system_packages.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ResolverConfig::from_toml("").unwrap();
        assert_eq!(config, ResolverConfig::default());
        assert_eq!(config.strategy, RequirementStrategy::NoAmbiguity);
        assert_eq!(config.system_packages, vec!["java.*"]);
    }

    #[test]
    fn test_full_config() {
        let config = ResolverConfig::from_toml(
            r#"
name = "bundles"
strategy = "first"
system_packages = ["java.*", "javax.*"]
repository = "file:///srv/repo.toml"
cache_dir = "/tmp/cache"
"#,
        )
        .unwrap();
        assert_eq!(config.name, "bundles");
        assert_eq!(config.resolve_options().strategy, RequirementStrategy::First);
        assert_eq!(config.resolve_options().system_packages.len(), 2);
        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/cache")));
    }

    #[test]
    fn test_rejects_unknown_strategy_and_fields() {
        assert!(matches!(
            ResolverConfig::from_toml("strategy = \"best\""),
            Err(Error::ConfigParse(_))
        ));
        assert!(matches!(
            ResolverConfig::from_toml("strategies = \"first\""),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ResolverConfig::load(&dir.path().join("resolver.toml")),
            Err(Error::Io { .. })
        ));
    }
}
